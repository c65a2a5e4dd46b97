use futures::future::try_join_all;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::ast::LinkArguments;
use crate::runtime::cast::Caster;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::functions::{ArgValue, FunctionDefinition, ResolvedArguments};
use crate::runtime::interpreter::Interpreter;
use crate::runtime::values::Value;

/// Resolve the call-site arguments of one link into the argument map handed
/// to the function.
///
/// Every argument name is checked before anything is evaluated. Argument
/// expressions run against the link's own context and are joined
/// concurrently; each argument keeps its values in call-site order.
pub async fn resolve_args(
    interpreter: &Interpreter,
    definition: &FunctionDefinition,
    context: &Value,
    ast_args: &LinkArguments,
) -> RuntimeResult<ResolvedArguments> {
    let primary_names = ast_args
        .keys()
        .map(|name| {
            definition
                .resolve_arg_name(name)
                .map(str::to_string)
                .ok_or_else(|| RuntimeError::UnknownArgument {
                    function: definition.name.clone(),
                    argument: name.clone(),
                })
        })
        .collect::<RuntimeResult<Vec<_>>>()
        .map_err(|err| {
            warn!(function = %definition.name, error = %err, "arguments rejected");
            err
        })?;

    let evaluated = try_join_all(ast_args.values().map(|nodes| {
        try_join_all(
            nodes
                .iter()
                .map(|node| interpreter.interpret(node, context.clone())),
        )
    }))
    .await
    .map_err(|err| {
        debug!(function = %definition.name, error = %err, "argument evaluation failed");
        err
    })?;

    // Alias keys fold into their primary name, in call-site order.
    let mut bound: IndexMap<String, Vec<Value>> = IndexMap::new();
    for (name, values) in primary_names.into_iter().zip(evaluated) {
        bound.entry(name).or_default().extend(values);
    }

    bind_parameters(interpreter.caster(), definition, bound).map_err(|err| {
        warn!(function = %definition.name, error = %err, "arguments rejected");
        err
    })
}

/// Apply defaults and casting to evaluated argument values.
///
/// Declared arguments missing from `bound` receive `[default]`, or `[null]`
/// without a default. An argument bound to an empty list stays empty. Multi
/// arguments cast every value; the others cast only the last one, or null
/// when there is none.
pub fn bind_parameters(
    caster: &Caster,
    definition: &FunctionDefinition,
    mut bound: IndexMap<String, Vec<Value>>,
) -> RuntimeResult<ResolvedArguments> {
    let mut resolved = ResolvedArguments::new();

    for (name, arg_def) in &definition.args {
        let values = match bound.shift_remove(name) {
            Some(values) => values,
            None => vec![arg_def.default.clone().unwrap_or(Value::Null)],
        };

        let cast = |value: Value| {
            caster
                .cast(value, &arg_def.types)
                .map_err(|source| RuntimeError::ArgumentCast {
                    function: definition.name.clone(),
                    argument: name.clone(),
                    source,
                })
        };

        let value = if arg_def.multi {
            ArgValue::Multi(values.into_iter().map(cast).collect::<RuntimeResult<Vec<_>>>()?)
        } else {
            // Last value wins; earlier ones were evaluated but are dropped here.
            let last = values.into_iter().last().unwrap_or(Value::Null);
            ArgValue::Single(cast(last)?)
        };
        resolved.insert(name.clone(), value);
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::functions::ArgumentDefinition;
    use crate::runtime::types::TypeRegistry;
    use crate::runtime::values::TypeName;
    use std::sync::Arc;

    fn caster() -> Caster {
        Caster::new(Arc::new(TypeRegistry::with_builtins()))
    }

    fn plot() -> FunctionDefinition {
        FunctionDefinition::builder("plot")
            .arg(ArgumentDefinition::new("series").types([TypeName::String]).multi())
            .arg(ArgumentDefinition::new("legend").types([TypeName::Boolean]).default_value(true))
            .arg(ArgumentDefinition::new("font").types([TypeName::String]))
            .sync_fn(|ctx, _| Ok(ctx))
    }

    #[test]
    fn defaults_fill_missing_arguments() {
        let resolved = bind_parameters(&caster(), &plot(), IndexMap::new()).unwrap();

        assert_eq!(resolved.get_multi("series"), Some(&[Value::String(String::new())][..]));
        assert_eq!(resolved.get("legend"), Some(&Value::Boolean(true)));
        // No default: null, then cast through string's null conversion.
        assert_eq!(resolved.get("font"), Some(&Value::String(String::new())));
        assert_eq!(resolved.names().collect::<Vec<_>>(), vec!["series", "legend", "font"]);
    }

    #[test]
    fn multi_casts_every_value_in_order() {
        let mut bound = IndexMap::new();
        bound.insert(
            "series".to_string(),
            vec![Value::Number(1.0), Value::String("b".into()), Value::Boolean(false)],
        );
        let resolved = bind_parameters(&caster(), &plot(), bound).unwrap();
        assert_eq!(
            resolved.get_multi("series").unwrap(),
            &[
                Value::String("1".into()),
                Value::String("b".into()),
                Value::String("false".into())
            ]
        );
    }

    #[test]
    fn single_keeps_only_the_last_value() {
        let mut bound = IndexMap::new();
        bound.insert(
            "legend".to_string(),
            vec![Value::Boolean(true), Value::Number(0.0)],
        );
        let resolved = bind_parameters(&caster(), &plot(), bound).unwrap();
        assert_eq!(resolved.get("legend"), Some(&Value::Boolean(false)));
    }

    #[test]
    fn empty_value_list_is_not_defaulted() {
        let mut bound = IndexMap::new();
        bound.insert("series".to_string(), Vec::new());
        bound.insert("legend".to_string(), Vec::new());
        let resolved = bind_parameters(&caster(), &plot(), bound).unwrap();

        assert_eq!(resolved.get_multi("series"), Some(&[][..]));
        // Nothing to keep: null, cast to boolean rather than the `true` default.
        assert_eq!(resolved.get("legend"), Some(&Value::Boolean(false)));
    }

    #[test]
    fn cast_failures_name_function_and_argument() {
        let strict = FunctionDefinition::builder("strict")
            .arg(ArgumentDefinition::new("n").types([TypeName::Number]))
            .sync_fn(|ctx, _| Ok(ctx));
        let mut bound = IndexMap::new();
        bound.insert("n".to_string(), vec![Value::String("abc".into())]);

        match bind_parameters(&caster(), &strict, bound) {
            Err(RuntimeError::ArgumentCast { function, argument, source }) => {
                assert_eq!(function, "strict");
                assert_eq!(argument, "n");
                assert_eq!(source.from, TypeName::String);
            }
            other => panic!("expected ArgumentCast, got {:?}", other),
        }
    }
}
