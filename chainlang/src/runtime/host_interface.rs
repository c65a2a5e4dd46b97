//! Host Interface
//!
//! Defines the trait that bridges the interpreter (which only knows its own
//! function registry) and the host environment, which decides what happens
//! when a chain reaches a function the registry does not contain.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::ast::Expression;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::interpreter::Interpreter;
use crate::runtime::values::Value;

/// The contract between the interpreter and its host.
#[async_trait]
pub trait HostInterface: std::fmt::Debug + Send + Sync {
    /// Called when the first link of `expression` names an unregistered
    /// function. `expression` holds the rest of the chain, starting with that
    /// link, and `context` is the value the link would have received. The
    /// returned value becomes the result of the whole chain.
    async fn function_not_found(&self, expression: Expression, context: Value) -> RuntimeResult<Value>;
}

/// Host that fails every unresolved chain with
/// [`RuntimeError::FunctionNotRegistered`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RejectingHost;

#[async_trait]
impl HostInterface for RejectingHost {
    async fn function_not_found(&self, expression: Expression, _context: Value) -> RuntimeResult<Value> {
        let function = expression.head().unwrap_or_default();
        warn!(function, "function not registered");
        Err(RuntimeError::FunctionNotRegistered(function.to_string()))
    }
}

/// Host that hands unresolved chains to another interpreter, typically one
/// holding a different function set. What that interpreter does with its own
/// misses is up to its host.
#[derive(Debug, Clone)]
pub struct DelegatingHost {
    fallback: Interpreter,
}

impl DelegatingHost {
    pub fn new(fallback: Interpreter) -> Self {
        Self { fallback }
    }
}

#[async_trait]
impl HostInterface for DelegatingHost {
    async fn function_not_found(&self, expression: Expression, context: Value) -> RuntimeResult<Value> {
        debug!(
            function = expression.head().unwrap_or_default(),
            links = expression.chain.len(),
            "delegating chain to fallback interpreter"
        );
        self.fallback.invoke_chain(&expression.chain, context).await
    }
}

pub fn create_rejecting_host() -> Arc<dyn HostInterface> {
    Arc::new(RejectingHost)
}
