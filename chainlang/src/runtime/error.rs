// Error handling for the chainlang runtime

use thiserror::Error;

use crate::runtime::values::TypeName;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// A value could not be converted to any of the acceptable types.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Can not cast '{from}' to any of '{}'{}", join_types(.to), reason_suffix(.reason))]
pub struct CastError {
    pub from: TypeName,
    pub to: Vec<TypeName>,
    /// Message of the last conversion function that was tried and failed.
    pub reason: Option<String>,
}

/// Runtime errors that can occur while evaluating an expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// The AST contained a node the interpreter does not know how to evaluate
    #[error("Unknown AST object: {0}")]
    UnknownNodeType(String),

    /// Raised by hosts that refuse to resolve missing functions; the
    /// interpreter itself never raises it.
    #[error("Function not registered: {0}")]
    FunctionNotRegistered(String),

    #[error("Unknown argument to function: {function}({argument})")]
    UnknownArgument { function: String, argument: String },

    /// Input context could not be cast to what the function accepts
    #[error(transparent)]
    Cast(#[from] CastError),

    #[error("Invalid value for argument {function}({argument}): {source}")]
    ArgumentCast {
        function: String,
        argument: String,
        #[source]
        source: CastError,
    },

    /// The function returned something other than its declared type
    #[error("Function {function} should return '{expected}', actually returned '{actual}'")]
    ReturnType {
        function: String,
        expected: TypeName,
        actual: TypeName,
    },

    /// Failure reported by a function implementation
    #[error("Function {function} failed: {message}")]
    Function { function: String, message: String },

    #[error("Value is not callable: {0}")]
    NotCallable(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RuntimeError {
    pub fn function(function: impl Into<String>, message: impl Into<String>) -> Self {
        RuntimeError::Function {
            function: function.into(),
            message: message.into(),
        }
    }
}

fn join_types(types: &[TypeName]) -> String {
    types
        .iter()
        .map(TypeName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn reason_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(reason) => format!(" ({})", reason),
        None => String::new(),
    }
}
