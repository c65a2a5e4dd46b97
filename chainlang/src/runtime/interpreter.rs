//! Chain interpreter.
//!
//! Evaluates AST nodes against a context value. An expression's chain is run
//! one link at a time: arguments are resolved, the function is invoked with
//! the cast context, its output is checked against the declared return type
//! and becomes the context of the next link. A link naming an unregistered
//! function hands the rest of the chain to the [`HostInterface`].

use futures::future::{self, BoxFuture, FutureExt};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::ast::{AstNode, Expression, Link};
use crate::config::EvaluationConfig;
use crate::runtime::cast::Caster;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::functions::{FunctionDefinition, FunctionRegistry, ResolvedArguments};
use crate::runtime::host_interface::HostInterface;
use crate::runtime::param_binding::resolve_args;
use crate::runtime::types::TypeRegistry;
use crate::runtime::values::{Callable, Value};

/// Cheap to clone: registries and host are shared behind `Arc`s.
#[derive(Clone)]
pub struct Interpreter {
    functions: Arc<FunctionRegistry>,
    caster: Caster,
    host: Arc<dyn HostInterface>,
    config: Arc<EvaluationConfig>,
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("functions", &self.functions.names())
            .field("types", &self.caster.types().names())
            .field("host", &self.host)
            .finish()
    }
}

impl Interpreter {
    pub fn new(
        functions: Arc<FunctionRegistry>,
        types: Arc<TypeRegistry>,
        host: Arc<dyn HostInterface>,
    ) -> Self {
        Self {
            functions,
            caster: Caster::new(types),
            host,
            config: Arc::new(EvaluationConfig::default()),
        }
    }

    pub fn with_config(mut self, config: EvaluationConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn caster(&self) -> &Caster {
        &self.caster
    }

    /// Evaluate `node` against the configured default context.
    pub async fn run(&self, node: &AstNode) -> RuntimeResult<Value> {
        self.interpret(node, self.config.initial_context()).await
    }

    /// Evaluate a node.
    ///
    /// Partials evaluate to a function value that runs their chain when
    /// called; bare function references are returned as function values
    /// without being invoked; literals evaluate to their raw value.
    pub fn interpret<'a>(&'a self, node: &'a AstNode, context: Value) -> BoxFuture<'a, RuntimeResult<Value>> {
        match node {
            AstNode::Partial(expression) => future::ready(Ok(self.partial(expression))).boxed(),
            AstNode::Expression(expression) => self.invoke_chain(&expression.chain, context).boxed(),
            AstNode::Function(reference) => {
                future::ready(Ok(Value::Function(Callable::Reference(reference.clone())))).boxed()
            }
            AstNode::Literal(literal) => future::ready(Ok(Value::from(literal.clone()))).boxed(),
        }
    }

    /// Decode `json` with [`AstNode::from_json`] and evaluate it.
    pub async fn interpret_json(&self, json: &serde_json::Value, context: Value) -> RuntimeResult<Value> {
        let node = AstNode::from_json(json)?;
        self.interpret(&node, context).await
    }

    fn partial(&self, expression: &Expression) -> Value {
        let interpreter = self.clone();
        let expression = Arc::new(expression.clone());
        Value::Function(Callable::Partial(Arc::new(move |context: Value| {
            let interpreter = interpreter.clone();
            let expression = Arc::clone(&expression);
            async move { interpreter.invoke_chain(&expression.chain, context).await }.boxed()
        })))
    }

    /// Run `chain` starting from `context`, one link after another.
    pub async fn invoke_chain(&self, chain: &[Link], mut context: Value) -> RuntimeResult<Value> {
        for (index, link) in chain.iter().enumerate() {
            let Some(definition) = self.functions.lookup(&link.function) else {
                debug!(
                    function = %link.function,
                    remaining = chain.len() - index,
                    "function not registered, handing chain to host"
                );
                let rest = Expression::new(chain[index..].to_vec());
                return self.host.function_not_found(rest, context).await;
            };

            let args = resolve_args(self, &definition, &context, &link.arguments).await?;

            if self.config.trace_links {
                debug!(
                    function = %definition.name,
                    args = ?args.names().collect::<Vec<_>>(),
                    context = %context.type_name(),
                    "invoking link"
                );
            }

            context = self.invoke_function(&definition, context, args).await?;
        }
        Ok(context)
    }

    /// Invoke one function: cast the context, run the implementation and
    /// check what it returned.
    ///
    /// Failures raised here are logged at `warn`; errors the implementation
    /// merely passes along (e.g. from a partial it called) were already
    /// logged where they arose and only get a `debug` event.
    pub async fn invoke_function(
        &self,
        definition: &FunctionDefinition,
        context: Value,
        args: ResolvedArguments,
    ) -> RuntimeResult<Value> {
        let context = self
            .caster
            .cast(context, definition.context.types())
            .map_err(|err| {
                warn!(function = %definition.name, error = %err, "context rejected");
                RuntimeError::from(err)
            })?;

        let output = match definition.call(context, args).await {
            Ok(output) => output,
            Err(err) => {
                match &err {
                    RuntimeError::Function { function, .. } if *function == definition.name => {
                        warn!(function = %definition.name, error = %err, "function failed");
                    }
                    _ => debug!(function = %definition.name, error = %err, "error passed through function"),
                }
                return Err(err);
            }
        };

        // Enforced in release builds too.
        if let Some(expected) = definition.return_type {
            let actual = output.type_name();
            if actual != expected {
                let err = RuntimeError::ReturnType {
                    function: definition.name.clone(),
                    expected,
                    actual,
                };
                warn!(function = %definition.name, error = %err, "return type rejected");
                return Err(err);
            }
        }

        Ok(output)
    }
}
