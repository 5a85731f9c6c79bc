#![forbid(unsafe_code)]

//! Binding layer: attaches directives found on an element tree to scopes.
//!
//! - [`Node`]: shared handle to an in-memory element with attributes,
//!   children, text content, an input value and event handlers.
//! - [`Directive`]: a linker run once per element that carries its
//!   attribute, optionally on a fresh child scope.
//! - [`Compiler`]: walks a tree, resolves `<attribute>Directive` through the
//!   [`Injector`](ngl_runtime::Injector) and links what it finds.
//! - [`builtins`]: `ngl-bind`, `ngl-model`, `ngl-controller`, `ngl-click`.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use ngl_compile::{Compiler, Node};
//! use ngl_runtime::Injector;
//!
//! let injector = Rc::new(Injector::new());
//! let compiler = Compiler::with_builtins(Rc::clone(&injector));
//!
//! let input = Node::new("input").with_attr("ngl-model", "name");
//! let label = Node::new("span").with_attr("ngl-bind", "'Hello ' + name");
//! let root = Node::new("div").with_child(input.clone()).with_child(label.clone());
//! compiler.bootstrap(&root);
//!
//! input.type_text("ngl");
//! assert_eq!(label.text(), "Hello ngl");
//! ```

pub mod builtins;
pub mod compiler;
pub mod directive;
pub mod node;

pub use compiler::Compiler;
pub use directive::{Directive, LinkFn};
pub use node::{EventHandler, Node, WeakNode};
