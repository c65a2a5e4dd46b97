//! Function definitions and the registry the interpreter resolves links in.

use futures::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::runtime::error::RuntimeResult;
use crate::runtime::values::{TypeName, Value};

/// Normalized implementation: every function returns a boxed future.
pub type FunctionImpl =
    Arc<dyn Fn(Value, ResolvedArguments) -> BoxFuture<'static, RuntimeResult<Value>> + Send + Sync>;

// --- Argument schema ---

/// Schema for one declared argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDefinition {
    pub name: String,
    /// Acceptable types, in casting preference order. Empty accepts anything.
    pub types: Vec<TypeName>,
    /// Used only when the argument is absent from the call site.
    pub default: Option<Value>,
    /// Keep every value instead of only the last one.
    pub multi: bool,
    pub aliases: Vec<String>,
    pub help: String,
}

impl ArgumentDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
            default: None,
            multi: false,
            aliases: Vec::new(),
            help: String::new(),
        }
    }

    pub fn types(mut self, types: impl IntoIterator<Item = TypeName>) -> Self {
        self.types = types.into_iter().collect();
        self
    }

    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    pub fn aliases(mut self, aliases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }
}

/// Context types a function accepts. `None` means any context.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContextSpec {
    pub types: Option<Vec<TypeName>>,
}

impl ContextSpec {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn types(&self) -> &[TypeName] {
        self.types.as_deref().unwrap_or(&[])
    }
}

// --- Resolved arguments ---

#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Single(Value),
    Multi(Vec<Value>),
}

/// Arguments handed to an implementation: one entry per declared argument,
/// defaults already applied and every value cast.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedArguments {
    values: IndexMap<String, ArgValue>,
}

impl ResolvedArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get_arg(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    /// Value of a single-valued argument.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self.values.get(name)? {
            ArgValue::Single(value) => Some(value),
            ArgValue::Multi(_) => None,
        }
    }

    /// Values of a multi-valued argument.
    pub fn get_multi(&self, name: &str) -> Option<&[Value]> {
        match self.values.get(name)? {
            ArgValue::Multi(values) => Some(values),
            ArgValue::Single(_) => None,
        }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_number)
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// --- Function definitions ---

/// An immutable, registered function.
#[derive(Clone)]
pub struct FunctionDefinition {
    pub name: String,
    /// Declared return type. `None` disables the return-type check.
    pub return_type: Option<TypeName>,
    pub context: ContextSpec,
    /// Declared arguments, primary names only.
    pub args: IndexMap<String, ArgumentDefinition>,
    /// Alternate function names the registry also resolves.
    pub aliases: Vec<String>,
    pub help: String,
    arg_aliases: HashMap<String, String>,
    implementation: FunctionImpl,
}

impl FunctionDefinition {
    pub fn builder(name: impl Into<String>) -> FunctionBuilder {
        FunctionBuilder::new(name)
    }

    /// Map a call-site argument name (primary or alias) to its primary name.
    pub fn resolve_arg_name(&self, name: &str) -> Option<&str> {
        if let Some((primary, _)) = self.args.get_key_value(name) {
            return Some(primary.as_str());
        }
        self.arg_aliases.get(name).map(String::as_str)
    }

    pub fn arg(&self, name: &str) -> Option<&ArgumentDefinition> {
        self.resolve_arg_name(name).and_then(|primary| self.args.get(primary))
    }

    /// Whether a context of type `type_name` is accepted without casting.
    pub fn accepts(&self, type_name: TypeName) -> bool {
        match &self.context.types {
            None => true,
            Some(types) => types.contains(&type_name),
        }
    }

    /// Run the implementation.
    pub fn call(&self, context: Value, args: ResolvedArguments) -> BoxFuture<'static, RuntimeResult<Value>> {
        (self.implementation)(context, args)
    }
}

impl fmt::Debug for FunctionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDefinition")
            .field("name", &self.name)
            .field("return_type", &self.return_type)
            .field("context", &self.context)
            .field("args", &self.args.keys().collect::<Vec<_>>())
            .field("aliases", &self.aliases)
            .finish()
    }
}

pub struct FunctionBuilder {
    name: String,
    return_type: Option<TypeName>,
    context: ContextSpec,
    args: Vec<ArgumentDefinition>,
    aliases: Vec<String>,
    help: String,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            return_type: None,
            context: ContextSpec::any(),
            args: Vec::new(),
            aliases: Vec::new(),
            help: String::new(),
        }
    }

    pub fn returns(mut self, return_type: TypeName) -> Self {
        self.return_type = Some(return_type);
        self
    }

    pub fn context_types(mut self, types: impl IntoIterator<Item = TypeName>) -> Self {
        self.context.types = Some(types.into_iter().collect());
        self
    }

    pub fn arg(mut self, arg: ArgumentDefinition) -> Self {
        self.args.push(arg);
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Finish with a synchronous implementation; its result is wrapped in a
    /// ready future.
    pub fn sync_fn<F>(self, f: F) -> FunctionDefinition
    where
        F: Fn(Value, ResolvedArguments) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        self.finish(Arc::new(move |context, args| {
            futures::future::ready(f(context, args)).boxed()
        }))
    }

    /// Finish with an asynchronous implementation.
    pub fn async_fn<F, Fut>(self, f: F) -> FunctionDefinition
    where
        F: Fn(Value, ResolvedArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RuntimeResult<Value>> + Send + 'static,
    {
        self.finish(Arc::new(move |context, args| f(context, args).boxed()))
    }

    fn finish(self, implementation: FunctionImpl) -> FunctionDefinition {
        let mut args = IndexMap::new();
        let mut arg_aliases = HashMap::new();
        for arg in self.args {
            for alias in &arg.aliases {
                arg_aliases.insert(alias.clone(), arg.name.clone());
            }
            args.insert(arg.name.clone(), arg);
        }

        FunctionDefinition {
            name: self.name,
            return_type: self.return_type,
            context: self.context,
            args,
            aliases: self.aliases,
            help: self.help,
            arg_aliases,
            implementation,
        }
    }
}

// --- Registry ---

/// Function name -> definition. Populated once at startup and shared
/// read-only with the interpreter.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<FunctionDefinition>>,
    aliases: HashMap<String, String>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry populated by `builder`.
    pub fn with_functions<F>(builder: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut registry = Self::new();
        builder(&mut registry);
        registry
    }

    /// Registers a definition; an existing one with the same name is replaced.
    pub fn register(&mut self, definition: FunctionDefinition) {
        for alias in &definition.aliases {
            self.aliases.insert(alias.clone(), definition.name.clone());
        }
        self.functions
            .insert(definition.name.clone(), Arc::new(definition));
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<FunctionDefinition>> {
        if let Some(definition) = self.functions.get(name) {
            return Some(Arc::clone(definition));
        }
        self.aliases
            .get(name)
            .and_then(|primary| self.functions.get(primary))
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Registered function names (aliases excluded), sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(name: &str) -> FunctionBuilder {
        FunctionDefinition::builder(name)
    }

    #[test]
    fn argument_aliases_resolve_to_primary_name() {
        let def = echo("sort")
            .arg(ArgumentDefinition::new("_").types([TypeName::String]).aliases(["by", "column"]))
            .sync_fn(|ctx, _| Ok(ctx));

        assert_eq!(def.resolve_arg_name("_"), Some("_"));
        assert_eq!(def.resolve_arg_name("by"), Some("_"));
        assert_eq!(def.resolve_arg_name("column"), Some("_"));
        assert_eq!(def.resolve_arg_name("order"), None);
        assert_eq!(def.arg("by").map(|a| a.name.as_str()), Some("_"));
        // Aliases never appear as schema entries of their own.
        assert_eq!(def.args.len(), 1);
    }

    #[test]
    fn accepts_any_context_without_declared_types() {
        let open = echo("open").sync_fn(|ctx, _| Ok(ctx));
        assert!(open.accepts(TypeName::Datatable));

        let numeric = echo("numeric")
            .context_types([TypeName::Number])
            .sync_fn(|ctx, _| Ok(ctx));
        assert!(numeric.accepts(TypeName::Number));
        assert!(!numeric.accepts(TypeName::String));
        assert_eq!(numeric.context.types(), &[TypeName::Number]);
    }

    #[test]
    fn registration_replaces_by_name() {
        let mut registry = FunctionRegistry::new();
        registry.register(echo("f").help("first").sync_fn(|ctx, _| Ok(ctx)));
        registry.register(echo("f").help("second").sync_fn(|ctx, _| Ok(ctx)));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("f").unwrap().help, "second");
        assert!(registry.lookup("g").is_none());
    }

    #[test]
    fn function_aliases_are_looked_up() {
        let registry = FunctionRegistry::with_functions(|r| {
            r.register(echo("datatable").alias("table").sync_fn(|ctx, _| Ok(ctx)));
        });
        assert!(registry.contains("table"));
        assert_eq!(registry.lookup("table").unwrap().name, "datatable");
        assert_eq!(registry.names(), vec!["datatable"]);
    }

    #[tokio::test]
    async fn sync_and_async_implementations_share_one_shape() {
        let sync_def = echo("sync").sync_fn(|_, _| Ok(Value::Number(1.0)));
        let async_def = echo("async").async_fn(|_, _| async { Ok(Value::Number(2.0)) });

        let a = sync_def.call(Value::Null, ResolvedArguments::new()).await;
        let b = async_def.call(Value::Null, ResolvedArguments::new()).await;
        assert_eq!(a, Ok(Value::Number(1.0)));
        assert_eq!(b, Ok(Value::Number(2.0)));
    }

    #[test]
    fn resolved_arguments_accessors() {
        let mut args = ResolvedArguments::new();
        args.insert("n", ArgValue::Single(Value::Number(5.0)));
        args.insert("label", ArgValue::Single(Value::String("x".into())));
        args.insert("_", ArgValue::Multi(vec![Value::Number(1.0), Value::Number(2.0)]));

        assert_eq!(args.number("n"), Some(5.0));
        assert_eq!(args.string("label"), Some("x"));
        assert_eq!(args.get("_"), None);
        assert_eq!(args.get_multi("_").map(<[Value]>::len), Some(2));
        assert_eq!(args.names().collect::<Vec<_>>(), vec!["n", "label", "_"]);
    }
}
