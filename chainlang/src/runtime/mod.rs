//! Chainlang Runtime System
//!
//! The interpreter entry point lives in [`interpreter`]; the submodules below
//! hold the pieces it is assembled from.

pub mod cast;
pub mod error;
pub mod functions;
pub mod host_interface;
pub mod interpreter;
pub mod param_binding;
pub mod types;
pub mod values;

pub use cast::Caster;
pub use error::{CastError, RuntimeError, RuntimeResult};
pub use functions::{
    ArgValue, ArgumentDefinition, ContextSpec, FunctionBuilder, FunctionDefinition,
    FunctionRegistry, ResolvedArguments,
};
pub use host_interface::{create_rejecting_host, DelegatingHost, HostInterface, RejectingHost};
pub use interpreter::Interpreter;
pub use types::{TypeDescriptor, TypeRegistry};
pub use values::{Callable, Column, Datatable, Pointseries, PointseriesColumn, Render, TypeName, Value};
