// Runtime value system for chainlang
// Represents values flowing between chain links (different from the AST which represents parsed code)

use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::fmt;
use std::sync::Arc;

use crate::ast::{FunctionRef, Literal};
use crate::runtime::error::{RuntimeError, RuntimeResult};

/// The closed set of runtime type names.
///
/// Used both to tag values ([`Value::type_name`]) and in declared contracts
/// (argument types, context types, return types).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeName {
    Null,
    Boolean,
    Number,
    String,
    Object,
    Function,
    Datatable,
    Pointseries,
    Render,
}

impl TypeName {
    pub const ALL: [TypeName; 9] = [
        TypeName::Null,
        TypeName::Boolean,
        TypeName::Number,
        TypeName::String,
        TypeName::Object,
        TypeName::Function,
        TypeName::Datatable,
        TypeName::Pointseries,
        TypeName::Render,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeName::Null => "null",
            TypeName::Boolean => "boolean",
            TypeName::Number => "number",
            TypeName::String => "string",
            TypeName::Object => "object",
            TypeName::Function => "function",
            TypeName::Datatable => "datatable",
            TypeName::Pointseries => "pointseries",
            TypeName::Render => "render",
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Structured values ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
        }
    }
}

/// Tabular data: ordered columns plus rows keyed by column name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Datatable {
    pub columns: Vec<Column>,
    pub rows: Vec<JsonMap<String, JsonValue>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointseriesColumn {
    #[serde(rename = "type")]
    pub column_type: String,
    /// "dimension" or "measure"
    pub role: String,
    pub expression: String,
}

/// Rows projected onto named dimensions (x, y, color, ...).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pointseries {
    pub columns: IndexMap<String, PointseriesColumn>,
    pub rows: Vec<JsonMap<String, JsonValue>>,
}

impl Pointseries {
    pub fn to_datatable(&self) -> Datatable {
        Datatable {
            columns: self
                .columns
                .iter()
                .map(|(name, column)| Column::new(name.clone(), column.column_type.clone()))
                .collect(),
            rows: self.rows.clone(),
        }
    }
}

/// A value packaged for a renderer, e.g. `as: "table"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Render {
    pub render_as: String,
    pub value: Box<Value>,
}

impl Render {
    pub fn new(render_as: impl Into<String>, value: Value) -> Self {
        Self {
            render_as: render_as.into(),
            value: Box::new(value),
        }
    }
}

// --- Function values ---

/// Deferred chain produced by interpreting a partial node.
pub type PartialFn = dyn Fn(Value) -> BoxFuture<'static, RuntimeResult<Value>> + Send + Sync;

#[derive(Clone)]
pub enum Callable {
    /// A partial expression, runnable against any context.
    Partial(Arc<PartialFn>),
    /// A bare reference to a function, carried without invocation.
    Reference(FunctionRef),
}

impl Callable {
    /// Apply the callable to a context.
    pub async fn call(&self, context: Value) -> RuntimeResult<Value> {
        match self {
            Callable::Partial(run) => run(context).await,
            Callable::Reference(reference) => Err(RuntimeError::NotCallable(reference.name.clone())),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Partial(_) => write!(f, "Partial"),
            Callable::Reference(reference) => write!(f, "FunctionRef({})", reference.name),
        }
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callable::Partial(a), Callable::Partial(b)) => Arc::ptr_eq(a, b),
            (Callable::Reference(a), Callable::Reference(b)) => a == b,
            _ => false,
        }
    }
}

// --- Value ---

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Object(IndexMap<String, Value>),
    Function(Callable),
    Datatable(Datatable),
    Pointseries(Pointseries),
    Render(Render),
}

impl Value {
    /// The runtime type tag of this value. This is the only place the
    /// mapping lives; casting and return-type checks both go through it.
    pub fn type_name(&self) -> TypeName {
        match self {
            Value::Null => TypeName::Null,
            Value::Boolean(_) => TypeName::Boolean,
            Value::Number(_) => TypeName::Number,
            Value::String(_) => TypeName::String,
            Value::Object(_) => TypeName::Object,
            Value::Function(_) => TypeName::Function,
            Value::Datatable(_) => TypeName::Datatable,
            Value::Pointseries(_) => TypeName::Pointseries,
            Value::Render(_) => TypeName::Render,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Value::Function(callable) => Some(callable),
            _ => None,
        }
    }
}

/// Numbers print without a trailing `.0` when they are integral.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Object(fields) => {
                let items: Vec<String> = fields
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect();
                write!(f, "{{{}}}", items.join(", "))
            }
            Value::Function(callable) => write!(f, "#<function {:?}>", callable),
            Value::Datatable(table) => write!(
                f,
                "#<datatable {} columns, {} rows>",
                table.columns.len(),
                table.rows.len()
            ),
            Value::Pointseries(series) => write!(
                f,
                "#<pointseries {} columns, {} rows>",
                series.columns.len(),
                series.rows.len()
            ),
            Value::Render(render) => write!(f, "#<render as {}: {}>", render.render_as, render.value),
        }
    }
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Null => Value::Null,
            Literal::Boolean(b) => Value::Boolean(b),
            Literal::Number(n) => Value::Number(n),
            Literal::String(s) => Value::String(s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Datatable> for Value {
    fn from(table: Datatable) -> Self {
        Value::Datatable(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_maps_to_its_type_name() {
        let values = vec![
            Value::Null,
            Value::Boolean(true),
            Value::Number(1.0),
            Value::String("s".into()),
            Value::Object(IndexMap::new()),
            Value::Function(Callable::Reference(FunctionRef::new("f"))),
            Value::Datatable(Datatable::default()),
            Value::Pointseries(Pointseries::default()),
            Value::Render(Render::new("debug", Value::Null)),
        ];
        let names: Vec<TypeName> = values.iter().map(Value::type_name).collect();
        assert_eq!(names, TypeName::ALL.to_vec());
    }

    #[test]
    fn type_names_serialize_lowercase() {
        let json = serde_json::to_string(&TypeName::Pointseries).unwrap();
        assert_eq!(json, "\"pointseries\"");
        let parsed: TypeName = serde_json::from_str("\"datatable\"").unwrap();
        assert_eq!(parsed, TypeName::Datatable);
    }

    #[test]
    fn integral_numbers_display_without_fraction() {
        assert_eq!(Value::Number(6.0).to_string(), "6");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
    }

    #[test]
    fn pointseries_projects_to_datatable_columns() {
        let mut series = Pointseries::default();
        series.columns.insert(
            "x".to_string(),
            PointseriesColumn {
                column_type: "number".to_string(),
                role: "dimension".to_string(),
                expression: "cost".to_string(),
            },
        );
        let table = series.to_datatable();
        assert_eq!(table.columns, vec![Column::new("x", "number")]);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn pointseries_json_keeps_column_order() {
        let json = r#"{
            "columns": {
                "y": {"type": "number", "role": "measure", "expression": "cost"},
                "x": {"type": "string", "role": "dimension", "expression": "name"}
            },
            "rows": [{"x": "a", "y": 2}]
        }"#;

        let series: Pointseries = serde_json::from_str(json).unwrap();
        assert_eq!(series.columns.keys().collect::<Vec<_>>(), vec!["y", "x"]);
        assert_eq!(series.rows.len(), 1);

        let encoded = serde_json::to_string(&series).unwrap();
        let decoded: Pointseries = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, series);
    }

    #[tokio::test]
    async fn references_are_not_callable() {
        let callable = Callable::Reference(FunctionRef::new("double"));
        assert_eq!(
            callable.call(Value::Null).await,
            Err(RuntimeError::NotCallable("double".to_string()))
        );
    }
}
