//! Chainlang: an asynchronous interpreter for chained function-call
//! expressions.
//!
//! An expression is a chain of links (`demodata | sort by="cost" | table`).
//! Each link names a registered function; the value produced by one link is
//! the context of the next. Arguments are themselves AST nodes, evaluated
//! against the link's context and cast to the types the function declares.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use chainlang::{
//!     create_rejecting_host, AstNode, FunctionDefinition, FunctionRegistry, Interpreter, Link,
//!     TypeName, TypeRegistry, Value,
//! };
//!
//! # fn main() -> chainlang::RuntimeResult<()> {
//! let functions = FunctionRegistry::with_functions(|r| {
//!     r.register(
//!         FunctionDefinition::builder("double")
//!             .returns(TypeName::Number)
//!             .context_types([TypeName::Number])
//!             .sync_fn(|ctx, _| Ok(Value::Number(ctx.as_number().unwrap_or(0.0) * 2.0))),
//!     );
//! });
//! let interpreter = Interpreter::new(
//!     Arc::new(functions),
//!     Arc::new(TypeRegistry::with_builtins()),
//!     create_rejecting_host(),
//! );
//! let expression = AstNode::expression(vec![Link::new("double")]);
//! let value = futures::executor::block_on(interpreter.interpret(&expression, Value::Number(3.0)))?;
//! assert_eq!(value, Value::Number(6.0));
//! # Ok(())
//! # }
//! ```

pub mod ast;
pub mod config;
pub mod runtime;

pub use ast::{AstNode, Expression, FunctionRef, Link, LinkArguments, Literal};
pub use config::{init_logging, EvaluationConfig, InterpreterConfig, LoggingConfig};
pub use runtime::{
    create_rejecting_host, ArgValue, ArgumentDefinition, Callable, CastError, DelegatingHost,
    FunctionDefinition, FunctionRegistry, HostInterface, Interpreter, RejectingHost,
    ResolvedArguments, RuntimeError, RuntimeResult, TypeDescriptor, TypeName, TypeRegistry, Value,
};
