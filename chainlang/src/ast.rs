//! Expression AST consumed by the interpreter.
//!
//! Nodes are produced by an external parser. Besides building them directly,
//! [`AstNode::from_json`] accepts the parser's JSON shape:
//!
//! ```text
//! {"type": "expression", "chain": [{"function": "double", "arguments": {}}]}
//! {"type": "partial",    "chain": [...]}
//! {"type": "function",   "name": "double"}
//! 3, "text", true, null                       (literals)
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::runtime::error::{RuntimeError, RuntimeResult};

// --- Literals ---

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

// --- Chains ---

/// Call-site arguments of one link. Every argument is multi-valued at the
/// AST level; the function's schema decides how many values survive.
pub type LinkArguments = IndexMap<String, Vec<AstNode>>;

/// One function call inside a chain.
#[derive(Debug, PartialEq, Clone)]
pub struct Link {
    pub function: String,
    pub arguments: LinkArguments,
}

impl Link {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            arguments: IndexMap::new(),
        }
    }

    /// Append a value to the named argument, keeping earlier values.
    pub fn arg(mut self, name: impl Into<String>, value: AstNode) -> Self {
        self.arguments.entry(name.into()).or_default().push(value);
        self
    }
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Expression {
    pub chain: Vec<Link>,
}

impl Expression {
    pub fn new(chain: Vec<Link>) -> Self {
        Self { chain }
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Name of the function the chain starts with.
    pub fn head(&self) -> Option<&str> {
        self.chain.first().map(|link| link.function.as_str())
    }
}

/// A bare function reference, passed around without being invoked.
#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub struct FunctionRef {
    pub name: String,
}

impl FunctionRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

// --- Nodes ---

#[derive(Debug, PartialEq, Clone)]
pub enum AstNode {
    Expression(Expression),
    Partial(Expression),
    Function(FunctionRef),
    Literal(Literal),
}

impl AstNode {
    pub fn expression(chain: Vec<Link>) -> Self {
        AstNode::Expression(Expression::new(chain))
    }

    pub fn partial(chain: Vec<Link>) -> Self {
        AstNode::Partial(Expression::new(chain))
    }

    pub fn function(name: impl Into<String>) -> Self {
        AstNode::Function(FunctionRef::new(name))
    }

    pub fn string(value: impl Into<String>) -> Self {
        AstNode::Literal(Literal::String(value.into()))
    }

    pub fn number(value: f64) -> Self {
        AstNode::Literal(Literal::Number(value))
    }

    pub fn boolean(value: bool) -> Self {
        AstNode::Literal(Literal::Boolean(value))
    }

    pub fn null() -> Self {
        AstNode::Literal(Literal::Null)
    }

    /// The node's tag as the parser spells it.
    pub fn kind(&self) -> &'static str {
        match self {
            AstNode::Expression(_) => "expression",
            AstNode::Partial(_) => "partial",
            AstNode::Function(_) => "function",
            AstNode::Literal(Literal::Null) => "null",
            AstNode::Literal(Literal::Boolean(_)) => "boolean",
            AstNode::Literal(Literal::Number(_)) => "number",
            AstNode::Literal(Literal::String(_)) => "string",
        }
    }

    /// Decode a node from the parser's JSON representation.
    ///
    /// Anything that is not a recognised node shape fails with
    /// [`RuntimeError::UnknownNodeType`].
    pub fn from_json(json: &JsonValue) -> RuntimeResult<AstNode> {
        match json {
            JsonValue::Null => Ok(AstNode::null()),
            JsonValue::Bool(b) => Ok(AstNode::boolean(*b)),
            JsonValue::String(s) => Ok(AstNode::string(s.clone())),
            JsonValue::Number(n) => n
                .as_f64()
                .map(AstNode::number)
                .ok_or_else(|| unknown_node(json)),
            JsonValue::Object(object) => {
                let tag = object
                    .get("type")
                    .and_then(JsonValue::as_str)
                    .ok_or_else(|| unknown_node(json))?;
                match tag {
                    "expression" => Ok(AstNode::Expression(chain_from_json(json)?)),
                    "partial" => Ok(AstNode::Partial(chain_from_json(json)?)),
                    "function" => object
                        .get("name")
                        .and_then(JsonValue::as_str)
                        .map(AstNode::function)
                        .ok_or_else(|| unknown_node(json)),
                    _ => Err(unknown_node(json)),
                }
            }
            JsonValue::Array(_) => Err(unknown_node(json)),
        }
    }
}

impl From<Literal> for AstNode {
    fn from(literal: Literal) -> Self {
        AstNode::Literal(literal)
    }
}

fn unknown_node(json: &JsonValue) -> RuntimeError {
    RuntimeError::UnknownNodeType(json.to_string())
}

fn chain_from_json(json: &JsonValue) -> RuntimeResult<Expression> {
    let links = json
        .get("chain")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| unknown_node(json))?;

    let mut chain = Vec::with_capacity(links.len());
    for link in links {
        let function = link
            .get("function")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| unknown_node(link))?;

        let mut arguments = LinkArguments::new();
        match link.get("arguments") {
            None | Some(JsonValue::Null) => {}
            Some(JsonValue::Object(args)) => {
                for (name, values) in args {
                    let values = values.as_array().ok_or_else(|| unknown_node(values))?;
                    let nodes = values
                        .iter()
                        .map(AstNode::from_json)
                        .collect::<RuntimeResult<Vec<_>>>()?;
                    arguments.insert(name.clone(), nodes);
                }
            }
            Some(other) => return Err(unknown_node(other)),
        }

        chain.push(Link {
            function: function.to_string(),
            arguments,
        });
    }
    Ok(Expression::new(chain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_literals() {
        assert_eq!(AstNode::from_json(&json!(null)).unwrap(), AstNode::null());
        assert_eq!(AstNode::from_json(&json!(true)).unwrap(), AstNode::boolean(true));
        assert_eq!(AstNode::from_json(&json!(2.5)).unwrap(), AstNode::number(2.5));
        assert_eq!(AstNode::from_json(&json!("hi")).unwrap(), AstNode::string("hi"));
    }

    #[test]
    fn decodes_expression_with_multi_valued_arguments() {
        let node = AstNode::from_json(&json!({
            "type": "expression",
            "chain": [
                {"function": "double", "arguments": {}},
                {"function": "addN", "arguments": {"n": [1, {"type": "partial", "chain": []}]}}
            ]
        }))
        .unwrap();

        let expected = AstNode::expression(vec![
            Link::new("double"),
            Link::new("addN")
                .arg("n", AstNode::number(1.0))
                .arg("n", AstNode::partial(vec![])),
        ]);
        assert_eq!(node, expected);
    }

    #[test]
    fn missing_arguments_field_is_an_empty_map() {
        let node = AstNode::from_json(&json!({
            "type": "expression",
            "chain": [{"function": "noop"}]
        }))
        .unwrap();
        match node {
            AstNode::Expression(expr) => {
                assert_eq!(expr.head(), Some("noop"));
                assert!(expr.chain[0].arguments.is_empty());
            }
            other => panic!("expected expression, got {:?}", other),
        }
    }

    #[test]
    fn decodes_function_reference() {
        let node = AstNode::from_json(&json!({"type": "function", "name": "double"})).unwrap();
        assert_eq!(node, AstNode::function("double"));
        assert_eq!(node.kind(), "function");
    }

    #[test]
    fn rejects_unknown_tags_and_shapes() {
        for bad in [
            json!({"type": "lambda", "chain": []}),
            json!({"chain": []}),
            json!([1, 2]),
            json!({"type": "expression"}),
            json!({"type": "expression", "chain": [{"arguments": {}}]}),
            json!({"type": "expression", "chain": [{"function": "f", "arguments": {"a": 1}}]}),
        ] {
            match AstNode::from_json(&bad) {
                Err(RuntimeError::UnknownNodeType(_)) => {}
                other => panic!("expected UnknownNodeType for {}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn literal_deserializes_from_raw_scalars() {
        let lit: Literal = serde_json::from_str("4").unwrap();
        assert_eq!(lit, Literal::Number(4.0));
        let lit: Literal = serde_json::from_str("null").unwrap();
        assert_eq!(lit, Literal::Null);
        let lit: Literal = serde_json::from_str("\"x\"").unwrap();
        assert_eq!(lit, Literal::String("x".to_string()));
    }
}
