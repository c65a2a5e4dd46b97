//! Caster: converts runtime values to one of a list of acceptable types.

use std::sync::Arc;

use crate::runtime::error::CastError;
use crate::runtime::types::TypeRegistry;
use crate::runtime::values::{TypeName, Value};

#[derive(Debug, Clone)]
pub struct Caster {
    types: Arc<TypeRegistry>,
}

impl Caster {
    pub fn new(types: Arc<TypeRegistry>) -> Self {
        Self { types }
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Cast `value` to the first acceptable type it can reach.
    ///
    /// An empty list accepts anything. Otherwise each type is tried in the
    /// order given: exact match first, then the value's own `to` conversion,
    /// then the target's `from` conversion. A conversion that fails counts as
    /// a miss and the search moves on.
    pub fn cast(&self, value: Value, acceptable: &[TypeName]) -> Result<Value, CastError> {
        if acceptable.is_empty() {
            return Ok(value);
        }

        let from = value.type_name();
        let source = self.types.get(from);
        let mut reason = None;

        for &target in acceptable {
            if target == from {
                return Ok(value);
            }

            let candidates = [
                source.and_then(|descriptor| descriptor.converter_to(target)),
                self.types
                    .get(target)
                    .and_then(|descriptor| descriptor.converter_from(from)),
            ];
            for conversion in candidates.into_iter().flatten() {
                match conversion(value.clone()) {
                    Ok(converted) => return Ok(converted),
                    Err(err) => reason = Some(err.to_string()),
                }
            }
        }

        Err(CastError {
            from,
            to: acceptable.to_vec(),
            reason,
        })
    }
}
