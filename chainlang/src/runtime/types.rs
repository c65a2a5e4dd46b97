//! Type registry: named type descriptors and the conversions between them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::values::{format_number, Datatable, Pointseries, Render, TypeName, Value};

/// A conversion between two types. Receives the value to convert.
pub type Conversion = Arc<dyn Fn(Value) -> RuntimeResult<Value> + Send + Sync>;

/// Describes one type and which other types it converts from and to.
#[derive(Clone)]
pub struct TypeDescriptor {
    pub name: TypeName,
    from: HashMap<TypeName, Conversion>,
    to: HashMap<TypeName, Conversion>,
}

impl TypeDescriptor {
    pub fn new(name: TypeName) -> Self {
        Self {
            name,
            from: HashMap::new(),
            to: HashMap::new(),
        }
    }

    /// Register a conversion producing this type from `source`.
    pub fn cast_from<F>(mut self, source: TypeName, conversion: F) -> Self
    where
        F: Fn(Value) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        self.from.insert(source, Arc::new(conversion));
        self
    }

    /// Register a conversion consuming this type into `target`.
    pub fn cast_to<F>(mut self, target: TypeName, conversion: F) -> Self
    where
        F: Fn(Value) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        self.to.insert(target, Arc::new(conversion));
        self
    }

    pub fn casts_from(&self, source: TypeName) -> bool {
        self.from.contains_key(&source)
    }

    pub fn casts_to(&self, target: TypeName) -> bool {
        self.to.contains_key(&target)
    }

    pub fn converter_from(&self, source: TypeName) -> Option<&Conversion> {
        self.from.get(&source)
    }

    pub fn converter_to(&self, target: TypeName) -> Option<&Conversion> {
        self.to.get(&target)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut from: Vec<_> = self.from.keys().collect();
        let mut to: Vec<_> = self.to.keys().collect();
        from.sort();
        to.sort();
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("from", &from)
            .field("to", &to)
            .finish()
    }
}

/// Holds the descriptors the caster consults. Built once, then shared
/// read-only.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<TypeName, TypeDescriptor>,
}

impl TypeRegistry {
    /// Creates an empty registry: values only pass casts by exact type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in descriptors.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for descriptor in builtin_types() {
            registry.register(descriptor);
        }
        registry
    }

    /// Registers a descriptor, replacing any previous one with the same name.
    pub fn register(&mut self, descriptor: TypeDescriptor) {
        self.types.insert(descriptor.name, descriptor);
    }

    pub fn get(&self, name: TypeName) -> Option<&TypeDescriptor> {
        self.types.get(&name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<TypeName> {
        let mut names: Vec<_> = self.types.keys().copied().collect();
        names.sort();
        names
    }
}

// --- Built-in types ---

fn unexpected(expected: TypeName, value: &Value) -> RuntimeError {
    RuntimeError::function(
        format!("cast:{}", expected),
        format!("conversion received '{}'", value.type_name()),
    )
}

fn boolean_type() -> TypeDescriptor {
    TypeDescriptor::new(TypeName::Boolean)
        .cast_from(TypeName::Null, |_| Ok(Value::Boolean(false)))
        .cast_from(TypeName::Number, |value| match value {
            Value::Number(n) => Ok(Value::Boolean(n != 0.0 && !n.is_nan())),
            other => Err(unexpected(TypeName::Number, &other)),
        })
        .cast_from(TypeName::String, |value| match value {
            Value::String(s) => Ok(Value::Boolean(!s.is_empty())),
            other => Err(unexpected(TypeName::String, &other)),
        })
}

fn number_type() -> TypeDescriptor {
    TypeDescriptor::new(TypeName::Number)
        .cast_from(TypeName::Null, |_| Ok(Value::Number(0.0)))
        .cast_from(TypeName::Boolean, |value| match value {
            Value::Boolean(b) => Ok(Value::Number(if b { 1.0 } else { 0.0 })),
            other => Err(unexpected(TypeName::Boolean, &other)),
        })
        .cast_from(TypeName::String, |value| match value {
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(Value::Number(0.0));
                }
                trimmed.parse::<f64>().map(Value::Number).map_err(|_| {
                    RuntimeError::function("cast:number", format!("'{}' is not a number", s))
                })
            }
            other => Err(unexpected(TypeName::String, &other)),
        })
}

fn string_type() -> TypeDescriptor {
    TypeDescriptor::new(TypeName::String)
        .cast_from(TypeName::Null, |_| Ok(Value::String(String::new())))
        .cast_from(TypeName::Boolean, |value| match value {
            Value::Boolean(b) => Ok(Value::String(b.to_string())),
            other => Err(unexpected(TypeName::Boolean, &other)),
        })
        .cast_from(TypeName::Number, |value| match value {
            Value::Number(n) => Ok(Value::String(format_number(n))),
            other => Err(unexpected(TypeName::Number, &other)),
        })
}

fn datatable_type() -> TypeDescriptor {
    TypeDescriptor::new(TypeName::Datatable)
        .cast_from(TypeName::Null, |_| Ok(Value::Datatable(Datatable::default())))
        .cast_from(TypeName::Pointseries, |value| match value {
            Value::Pointseries(series) => Ok(Value::Datatable(series.to_datatable())),
            other => Err(unexpected(TypeName::Pointseries, &other)),
        })
        .cast_to(TypeName::Render, |value| match value {
            Value::Datatable(_) => Ok(Value::Render(Render::new("table", value))),
            other => Err(unexpected(TypeName::Datatable, &other)),
        })
}

fn pointseries_type() -> TypeDescriptor {
    TypeDescriptor::new(TypeName::Pointseries)
        .cast_from(TypeName::Null, |_| Ok(Value::Pointseries(Pointseries::default())))
        .cast_to(TypeName::Render, |value| match value {
            Value::Pointseries(series) => Ok(Value::Render(Render::new(
                "table",
                Value::Datatable(series.to_datatable()),
            ))),
            other => Err(unexpected(TypeName::Pointseries, &other)),
        })
}

/// The descriptors registered by [`TypeRegistry::with_builtins`].
pub fn builtin_types() -> Vec<TypeDescriptor> {
    vec![
        TypeDescriptor::new(TypeName::Null),
        boolean_type(),
        number_type(),
        string_type(),
        datatable_type(),
        pointseries_type(),
        TypeDescriptor::new(TypeName::Render),
    ]
}
