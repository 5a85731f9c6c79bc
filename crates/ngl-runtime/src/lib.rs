#![forbid(unsafe_code)]

//! Scopes, the digest loop and the dependency-injection container.
//!
//! - [`Scope`]: a node in the binding-context tree. Holds local bindings,
//!   watchers and children; lookups read through to ancestors.
//! - [`Injector`]: name-keyed factory registry that resolves a factory's
//!   declared parameters recursively and caches every result.
//! - [`RuntimeConfig`]: knobs shared by a tree (digest bound, evaluation
//!   diagnostics).
//!
//! # Architecture
//!
//! Everything is single-threaded: scopes are `Rc` handles with `RefCell`
//! interiors, and parents are held weakly by their children. No interior
//! borrow is held while user code runs (expression evaluation, watch
//! callbacks, factory bodies), so callbacks may add watchers, create
//! children, start nested digests or resolve further dependencies.
//!
//! # Invariants
//!
//! 1. Scope ids are unique within a tree and increase in creation order;
//!    the root is `0`.
//! 2. `digest` returns only once a full pass over a scope's watchers sees no
//!    change, then visits children in creation order.
//! 3. A name resolved once through [`Injector::get`] yields the same value
//!    for the lifetime of the container.
//!
//! # Failure Modes
//!
//! - Expression failures evaluate to `Undefined`; [`Scope::try_eval`]
//!   reports them.
//! - Unregistered dependencies resolve to `Null`; [`Injector::try_get`]
//!   reports them.
//! - A watcher pair that never agrees makes `digest` spin forever;
//!   [`Scope::digest_with_limit`] bounds it.

pub mod config;
pub mod injector;
#[cfg(feature = "tracing-json")]
pub mod logging;
pub mod scope;

pub use config::{ConfigError, RuntimeConfig};
pub use injector::{
    CONTROLLERS_SUFFIX, DIRECTIVES_SUFFIX, Injector, InjectorError, Locals, ROOT_SCOPE,
};
pub use scope::{DigestError, Scope, ScopeError, WatchExpr};
