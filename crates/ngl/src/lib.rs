#![forbid(unsafe_code)]

//! ngl public facade.
//!
//! A minimal binding runtime: a dependency-injection container, a scope tree
//! with dirty-checking, a sandboxed expression language, and directives that
//! keep an element tree and scope data in sync.
//!
//! ```
//! use ngl::prelude::*;
//! use std::rc::Rc;
//!
//! let injector = Rc::new(Injector::new());
//! injector.controller(
//!     "CounterCtrl",
//!     factory!(|scope: "$scope"| {
//!         if let Some(scope) = Scope::from_value(&scope) {
//!             scope.set("count", 0);
//!         }
//!     }),
//! );
//!
//! let label = Node::new("span").with_attr("ngl-bind", "count");
//! let button = Node::new("button").with_attr("ngl-click", "count = count + 1");
//! let app = Node::new("div")
//!     .with_attr("ngl-controller", "CounterCtrl")
//!     .with_child(label.clone())
//!     .with_child(button.clone());
//!
//! Compiler::with_builtins(injector).bootstrap(&app);
//! assert_eq!(label.text(), "0");
//! button.click();
//! assert_eq!(label.text(), "1");
//! ```

pub use ngl_compile as compile;
pub use ngl_core as core;
pub use ngl_expr as expr;
pub use ngl_runtime as runtime;

pub use ngl_compile::{Compiler, Directive, Node};
pub use ngl_core::{Array, Function, Object, Value, clone_value, equals, factory};
pub use ngl_expr::{EvalError, evaluate};
pub use ngl_runtime::{Injector, Locals, RuntimeConfig, Scope};

pub mod prelude {
    pub use ngl_compile::{Compiler, Directive, Node};
    pub use ngl_core::{Array, Function, Object, Value, clone_value, equals, factory};
    pub use ngl_expr::evaluate;
    pub use ngl_runtime::{Injector, Locals, RuntimeConfig, Scope};
}
