#![forbid(unsafe_code)]

//! Binding contexts and the dirty-checking digest loop.
//!
//! A [`Scope`] owns local bindings, an ordered watcher list and an ordered
//! child list. Name lookup reads through to ancestors; assignment always
//! binds locally, so a child shadows an ancestor's binding only after it
//! assigns its own. Mutating a shared array or object found on an ancestor
//! mutates the ancestor's value in place.
//!
//! # Digest
//!
//! [`Scope::digest`] evaluates every watcher in list order and compares the
//! result structurally against the watcher's snapshot. A change replaces the
//! snapshot with a deep clone and fires the callback immediately; passes
//! repeat until one sees no change, then every child is digested in
//! creation order.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use ngl_runtime::Scope;
//!
//! let scope = Scope::new();
//! let seen = Rc::new(Cell::new(0.0));
//! let sink = Rc::clone(&seen);
//! scope.watch("count * 2", move |v| sink.set(v.as_number().unwrap_or(-1.0)));
//!
//! scope.set("count", 21);
//! scope.digest();
//! assert_eq!(seen.get(), 42.0);
//! ```
//!
//! # Failure Modes
//!
//! - A watcher pair that never agrees keeps `digest` looping forever. Use
//!   [`Scope::digest_with_limit`] where that must be reported instead.
//! - Bindings that hold closures capturing their own scope form an `Rc`
//!   cycle and are only reclaimed with the process.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use ngl_core::{ScopeObject, ScopeRef, Value, clone_value, equals};
use ngl_expr::{Environment, EvalError};
use tracing::{debug, debug_span, trace, warn};

use crate::config::RuntimeConfig;

/// Getter form of a watch expression. Receives the owning scope.
pub type WatchGetter = Rc<dyn Fn(&Scope) -> Value>;

/// Change callback. Receives the newly observed value.
pub type WatchCallback = Rc<dyn Fn(&Value)>;

/// Something a scope can evaluate: expression text or a getter closure.
#[derive(Clone)]
pub enum WatchExpr {
    Source(Rc<str>),
    Getter(WatchGetter),
}

impl WatchExpr {
    pub fn getter(f: impl Fn(&Scope) -> Value + 'static) -> Self {
        Self::Getter(Rc::new(f))
    }
}

impl From<&str> for WatchExpr {
    fn from(source: &str) -> Self {
        Self::Source(Rc::from(source))
    }
}

impl From<String> for WatchExpr {
    fn from(source: String) -> Self {
        Self::Source(Rc::from(source))
    }
}

impl From<&String> for WatchExpr {
    fn from(source: &String) -> Self {
        Self::Source(Rc::from(source.as_str()))
    }
}

impl fmt::Debug for WatchExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(source) => write!(f, "{source:?}"),
            Self::Getter(_) => f.write_str("<getter>"),
        }
    }
}

struct Watcher {
    expr: WatchExpr,
    callback: WatchCallback,
    last: Value,
}

/// State shared by every scope of one tree.
struct TreeState {
    next_id: Cell<u64>,
    config: RuntimeConfig,
}

struct ScopeInner {
    id: u64,
    parent: Option<Weak<ScopeInner>>,
    tree: Rc<TreeState>,
    bindings: RefCell<IndexMap<String, Value>>,
    watchers: RefCell<Vec<Watcher>>,
    children: RefCell<Vec<Scope>>,
}

impl ScopeInner {
    fn parent(&self) -> Option<Rc<ScopeInner>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    fn resolve(&self, name: &str) -> Option<Value> {
        match name {
            "$id" => return Some(Value::Number(self.id as f64)),
            "$parent" => {
                return Some(self.parent().map_or(Value::Null, |parent| {
                    Value::Scope(ScopeRef::new(parent))
                }));
            }
            _ => {}
        }
        let local = self.bindings.borrow().get(name).cloned();
        local.or_else(|| self.parent().and_then(|parent| parent.resolve(name)))
    }
}

impl ScopeObject for ScopeInner {
    fn scope_id(&self) -> u64 {
        self.id
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        self.resolve(name)
    }

    fn assign(&self, name: &str, value: Value) {
        self.bindings.borrow_mut().insert(name.to_owned(), value);
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn std::any::Any> {
        self
    }
}

/// Handle to a node of the binding-context tree.
///
/// Cloning the handle shares the node.
#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    /// Create a root scope (id `0`) with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a root scope whose tree uses `config`.
    #[must_use]
    pub fn with_config(config: RuntimeConfig) -> Self {
        let tree = Rc::new(TreeState {
            next_id: Cell::new(0),
            config,
        });
        Self::from_parts(0, None, tree)
    }

    fn from_parts(id: u64, parent: Option<Weak<ScopeInner>>, tree: Rc<TreeState>) -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                id,
                parent,
                tree,
                bindings: RefCell::new(IndexMap::new()),
                watchers: RefCell::new(Vec::new()),
                children: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Create a child that reads through to this scope and append it to
    /// this scope's children.
    #[must_use]
    pub fn new_child(&self) -> Scope {
        let tree = &self.inner.tree;
        let id = tree.next_id.get() + 1;
        tree.next_id.set(id);

        let child = Self::from_parts(
            id,
            Some(Rc::downgrade(&self.inner)),
            Rc::clone(tree),
        );
        self.inner.children.borrow_mut().push(child.clone());
        debug!(parent_id = self.id(), scope_id = id, "scope created");
        child
    }

    /// Unlink this scope from its parent's children. The scope keeps
    /// reading through to its former ancestors but is no longer digested
    /// with them.
    ///
    /// # Errors
    ///
    /// [`ScopeError::RootScope`] for a root, [`ScopeError::Detached`] when the
    /// scope is no longer among its parent's children.
    pub fn destroy(&self) -> Result<(), ScopeError> {
        let id = self.id();
        let Some(parent_link) = self.inner.parent.as_ref() else {
            return Err(ScopeError::RootScope);
        };
        let parent = parent_link.upgrade().ok_or(ScopeError::Detached { id })?;

        let mut siblings = parent.children.borrow_mut();
        let position = siblings
            .iter()
            .position(|sibling| sibling.ptr_eq(self))
            .ok_or(ScopeError::Detached { id })?;
        siblings.remove(position);
        debug!(scope_id = id, parent_id = parent.id, "scope destroyed");
        Ok(())
    }

    /// Register a watcher. The expression is evaluated now and its deep
    /// clone becomes the snapshot, so the callback does not fire until a
    /// digest observes a change.
    pub fn watch(&self, expr: impl Into<WatchExpr>, callback: impl Fn(&Value) + 'static) {
        let expr = expr.into();
        let last = clone_value(&self.evaluate(&expr));
        self.inner.watchers.borrow_mut().push(Watcher {
            expr,
            callback: Rc::new(callback),
            last,
        });
    }

    /// Evaluate expression text or a getter. Any failure yields
    /// `Undefined`; see [`Scope::try_eval`] for the error.
    pub fn eval(&self, expr: impl Into<WatchExpr>) -> Value {
        self.evaluate(&expr.into())
    }

    fn evaluate(&self, expr: &WatchExpr) -> Value {
        match expr {
            WatchExpr::Getter(getter) => getter(self),
            WatchExpr::Source(source) => match self.try_eval(source) {
                Ok(value) => value,
                Err(error) => {
                    if self.inner.tree.config.eval_diagnostics {
                        warn!(scope_id = self.id(), expr = %source, %error, "expression failed");
                    } else {
                        trace!(scope_id = self.id(), expr = %source, %error, "expression failed");
                    }
                    Value::Undefined
                }
            },
        }
    }

    /// Evaluate expression text against this scope.
    ///
    /// # Errors
    ///
    /// Returns the parse or evaluation error.
    pub fn try_eval(&self, source: &str) -> Result<Value, EvalError> {
        ngl_expr::evaluate(source, self)
    }

    /// Run passes until no watcher changes, then digest every child.
    ///
    /// Never returns if two watchers keep changing each other.
    pub fn digest(&self) {
        // Unbounded runs only return once every scope is settled.
        let _ = self.digest_bounded(None);
    }

    /// [`Scope::digest`] that gives up once one scope needs more than
    /// `max_passes` passes (the pass that confirms no change counts).
    /// Scopes settled before the limit was hit keep their updates.
    ///
    /// # Errors
    ///
    /// [`DigestError::IterationLimit`] naming the scope that did not settle.
    pub fn digest_with_limit(&self, max_passes: u32) -> Result<(), DigestError> {
        self.digest_bounded(Some(max_passes.max(1)))
    }

    fn digest_bounded(&self, limit: Option<u32>) -> Result<(), DigestError> {
        let scope_id = self.id();
        let span = debug_span!("digest", scope_id);
        let _guard = span.enter();

        let mut passes: u32 = 0;
        loop {
            passes = passes.saturating_add(1);
            if !self.digest_pass() {
                break;
            }
            if limit.is_some_and(|max| passes >= max) {
                warn!(scope_id, passes, "digest did not settle");
                return Err(DigestError::IterationLimit { scope_id, passes });
            }
        }
        trace!(passes, "scope settled");

        for child in self.children() {
            child.digest_bounded(limit)?;
        }
        Ok(())
    }

    /// One pass over the watchers. Watchers added by a callback are visited
    /// in the same pass.
    fn digest_pass(&self) -> bool {
        let mut dirty = false;
        let mut index = 0;
        loop {
            let Some(expr) = self
                .inner
                .watchers
                .borrow()
                .get(index)
                .map(|watcher| watcher.expr.clone())
            else {
                break;
            };

            let current = self.evaluate(&expr);
            let fired = {
                let mut watchers = self.inner.watchers.borrow_mut();
                match watchers.get_mut(index) {
                    Some(watcher) if !equals(&watcher.last, &current) => {
                        watcher.last = clone_value(&current);
                        Some(Rc::clone(&watcher.callback))
                    }
                    _ => None,
                }
            };

            if let Some(callback) = fired {
                dirty = true;
                trace!(watcher = index, ?expr, value = ?current, "watch fired");
                callback(&current);
            }
            index += 1;
        }
        dirty
    }

    /// Resolve `name` through this scope and its ancestors.
    #[must_use]
    pub fn get(&self, name: &str) -> Value {
        self.inner.resolve(name).unwrap_or_default()
    }

    /// Bind `name` on this scope.
    pub fn set(&self, name: &str, value: impl Into<Value>) {
        self.inner
            .bindings
            .borrow_mut()
            .insert(name.to_owned(), value.into());
    }

    /// `true` when `name` is bound on this scope itself.
    #[must_use]
    pub fn has_own(&self, name: &str) -> bool {
        self.inner.bindings.borrow().contains_key(name)
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// The parent, while it is alive. `None` for a root.
    #[must_use]
    pub fn parent(&self) -> Option<Scope> {
        self.inner.parent().map(|inner| Scope { inner })
    }

    /// Snapshot of the children in creation order.
    #[must_use]
    pub fn children(&self) -> Vec<Scope> {
        self.inner.children.borrow().clone()
    }

    #[must_use]
    pub fn watcher_count(&self) -> usize {
        self.inner.watchers.borrow().len()
    }

    #[must_use]
    pub fn config(&self) -> RuntimeConfig {
        self.inner.tree.config
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Wrap this scope as a [`Value`] (what `$scope` is bound to).
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Scope(ScopeRef::new(Rc::clone(&self.inner) as Rc<dyn ScopeObject>))
    }

    /// Recover a scope from a value produced by [`Scope::to_value`].
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Scope> {
        match value {
            Value::Scope(handle) => handle
                .downcast::<ScopeInner>()
                .map(|inner| Scope { inner }),
            _ => None,
        }
    }
}

impl From<Scope> for Value {
    fn from(scope: Scope) -> Self {
        scope.to_value()
    }
}

impl From<&Scope> for Value {
    fn from(scope: &Scope) -> Self {
        scope.to_value()
    }
}

impl Environment for Scope {
    fn lookup(&self, name: &str) -> Option<Value> {
        if name == "this" {
            return Some(self.to_value());
        }
        self.inner.resolve(name)
    }

    fn assign(&self, name: &str, value: Value) {
        self.set(name, value);
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id())
            .field("bindings", &self.inner.bindings.borrow().keys().collect::<Vec<_>>())
            .field("watchers", &self.watcher_count())
            .field("children", &self.inner.children.borrow().len())
            .finish()
    }
}

/// Error type for scope tree operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// The root scope has no parent to detach from.
    RootScope,
    /// The scope was already destroyed or its parent is gone.
    Detached { id: u64 },
}

impl fmt::Display for ScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootScope => write!(f, "the root scope cannot be destroyed"),
            Self::Detached { id } => write!(f, "scope {id} is not attached to a parent"),
        }
    }
}

impl std::error::Error for ScopeError {}

/// Error type for bounded digests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// A scope still had changing watchers after `passes` passes.
    IterationLimit { scope_id: u64, passes: u32 },
}

impl fmt::Display for DigestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IterationLimit { scope_id, passes } => write!(
                f,
                "scope {scope_id} did not settle after {passes} digest passes"
            ),
        }
    }
}

impl std::error::Error for DigestError {}
