//! Dependency-injection container.
//!
//! Factories are [`Function`] values registered under a name. Resolving a
//! name invokes its factory with one argument per declared parameter, each
//! resolved in turn, and caches the result for the container's lifetime.
//!
//! Directive and controller registrations share the same storage, told
//! apart by the [`DIRECTIVES_SUFFIX`] and [`CONTROLLERS_SUFFIX`] name
//! suffixes. A controller factory is wrapped in a zero-parameter factory
//! that returns it, so the cache holds the controller function itself and
//! every [`Injector::invoke`] of it runs against fresh locals.
//!
//! Dependency cycles are not detected and recurse until the stack runs out.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use ngl_core::{Function, Value};
use tracing::debug;

use crate::config::RuntimeConfig;
use crate::scope::Scope;

pub const DIRECTIVES_SUFFIX: &str = "Directive";
pub const CONTROLLERS_SUFFIX: &str = "Controller";
/// Name under which the root scope is pre-cached.
pub const ROOT_SCOPE: &str = "$rootScope";

/// Per-call bindings that take precedence over the cache.
#[derive(Debug, Clone, Default)]
pub struct Locals {
    entries: IndexMap<String, Value>,
}

impl Locals {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Locals {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// Name-keyed factory registry with a permanent resolution cache.
pub struct Injector {
    providers: RefCell<HashMap<String, Value>>,
    cache: RefCell<HashMap<String, Value>>,
    root: Scope,
    config: RuntimeConfig,
}

impl Default for Injector {
    fn default() -> Self {
        Self::new()
    }
}

impl Injector {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a container whose root scope tree uses `config`.
    #[must_use]
    pub fn with_config(config: RuntimeConfig) -> Self {
        let root = Scope::with_config(config);
        let cache = HashMap::from([(ROOT_SCOPE.to_owned(), root.to_value())]);
        Self {
            providers: RefCell::new(HashMap::new()),
            cache: RefCell::new(cache),
            root,
            config,
        }
    }

    /// Store `factory` under `name`, replacing any earlier registration.
    /// Values already resolved from the cache are unaffected.
    pub fn register(&self, name: impl Into<String>, factory: impl Into<Value>) {
        let name = name.into();
        debug!(name = %name, "factory registered");
        self.providers.borrow_mut().insert(name, factory.into());
    }

    /// Register a directive factory under `name + "Directive"`.
    pub fn directive(&self, name: &str, factory: impl Into<Value>) {
        self.register(format!("{name}{DIRECTIVES_SUFFIX}"), factory);
    }

    /// Register `controller` under `name + "Controller"`, wrapped so that
    /// resolving the name yields the controller function itself.
    pub fn controller(&self, name: &str, controller: Function) {
        let wrapped = Function::new(std::iter::empty::<&str>(), move |_| {
            Value::Function(controller.clone())
        });
        self.register(format!("{name}{CONTROLLERS_SUFFIX}"), wrapped);
    }

    /// Register a service factory under its plain name.
    pub fn service(&self, name: &str, factory: impl Into<Value>) {
        self.register(name, factory);
    }

    /// Declared parameter names of `factory`, in order.
    #[must_use]
    pub fn annotate(factory: &Function) -> Vec<String> {
        factory.params().to_vec()
    }

    /// Resolve `name`, returning `Null` when it cannot be resolved.
    pub fn get(&self, name: &str, locals: &Locals) -> Value {
        self.try_get(name, locals).unwrap_or_else(|error| {
            debug!(%error, "resolved to null");
            Value::Null
        })
    }

    /// Resolve `name`: the cached value if present, otherwise the result of
    /// invoking its factory, which is then cached regardless of `locals`.
    ///
    /// # Errors
    ///
    /// [`InjectorError::Unregistered`] when nothing is registered under
    /// `name`; [`InjectorError::NotCallable`] when the registration is not a
    /// function.
    pub fn try_get(&self, name: &str, locals: &Locals) -> Result<Value, InjectorError> {
        if let Some(cached) = self.cache.borrow().get(name) {
            return Ok(cached.clone());
        }

        let provider = self.providers.borrow().get(name).cloned();
        let factory = match provider {
            None => return Err(InjectorError::Unregistered(name.to_owned())),
            Some(Value::Function(factory)) => factory,
            Some(_) => return Err(InjectorError::NotCallable(name.to_owned())),
        };

        debug!(name, params = ?factory.params(), "instantiating");
        let instance = self.invoke(&factory, locals);
        self.cache
            .borrow_mut()
            .insert(name.to_owned(), instance.clone());
        Ok(instance)
    }

    /// Call `factory` with one argument per declared parameter. A truthy
    /// local wins; anything else is resolved through [`Injector::get`]
    /// with the same locals.
    pub fn invoke(&self, factory: &Function, locals: &Locals) -> Value {
        let args: Vec<Value> = factory
            .params()
            .iter()
            .map(|name| match locals.get(name) {
                Some(local) if local.is_truthy() => local.clone(),
                _ => self.get(name, locals),
            })
            .collect();
        factory.call(&args)
    }

    /// `true` when `name` is registered or already cached.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.providers.borrow().contains_key(name) || self.cache.borrow().contains_key(name)
    }

    /// The pre-cached root scope.
    #[must_use]
    pub fn root_scope(&self) -> Scope {
        self.root.clone()
    }

    #[must_use]
    pub fn config(&self) -> RuntimeConfig {
        self.config
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut providers: Vec<String> = self.providers.borrow().keys().cloned().collect();
        providers.sort();
        f.debug_struct("Injector")
            .field("providers", &providers)
            .field("cached", &self.cache.borrow().len())
            .field("config", &self.config)
            .finish()
    }
}

/// Error type for [`Injector::try_get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectorError {
    /// No factory is registered under the name.
    Unregistered(String),
    /// The registration is not a function.
    NotCallable(String),
}

impl fmt::Display for InjectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unregistered(name) => write!(f, "no factory registered for {name:?}"),
            Self::NotCallable(name) => write!(f, "registration {name:?} is not callable"),
        }
    }
}

impl std::error::Error for InjectorError {}
