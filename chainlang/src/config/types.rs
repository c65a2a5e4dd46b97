use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ast::Literal;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::values::Value;

/// Top-level interpreter configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    pub logging: LoggingConfig,
    pub evaluation: EvaluationConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `"chainlang=debug"`
    pub filter: String,
    /// Colorize output
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "chainlang=info".to_string(),
            ansi: true,
        }
    }
}

/// Evaluation configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Emit a debug event for every link with its argument names
    pub trace_links: bool,
    /// Context used by `Interpreter::run`. Absent means null.
    pub default_context: Option<Literal>,
}

impl EvaluationConfig {
    pub fn initial_context(&self) -> Value {
        self.default_context
            .clone()
            .map(Value::from)
            .unwrap_or(Value::Null)
    }
}

impl InterpreterConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> RuntimeResult<Self> {
        toml::from_str(content).map_err(|e| RuntimeError::Config(e.to_string()))
    }

    /// Create a configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> RuntimeResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn empty_document_uses_defaults() {
        let config = InterpreterConfig::from_toml_str("").unwrap();
        assert_eq!(config, InterpreterConfig::default());
        assert_eq!(config.logging.filter, "chainlang=info");
        assert_eq!(config.evaluation.initial_context(), Value::Null);
    }

    #[test]
    fn parses_all_sections() {
        let config = InterpreterConfig::from_toml_str(
            r#"
            [logging]
            filter = "chainlang=debug"
            ansi = false

            [evaluation]
            trace_links = true
            default_context = 3
            "#,
        )
        .unwrap();

        assert_eq!(
            config,
            InterpreterConfig {
                logging: LoggingConfig {
                    filter: "chainlang=debug".to_string(),
                    ansi: false,
                },
                evaluation: EvaluationConfig {
                    trace_links: true,
                    default_context: Some(Literal::Number(3.0)),
                },
            }
        );
        assert_eq!(config.evaluation.initial_context(), Value::Number(3.0));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let result = InterpreterConfig::from_toml_str("[evaluation\ntrace_links = 1");
        assert!(matches!(result, Err(RuntimeError::Config(_))));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[evaluation]\ndefault_context = \"seed\"").unwrap();

        let config = InterpreterConfig::from_file(file.path()).unwrap();
        assert_eq!(config.evaluation.initial_context(), Value::String("seed".into()));

        let missing = InterpreterConfig::from_file(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(RuntimeError::Config(_))));
    }
}
