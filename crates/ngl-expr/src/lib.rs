#![forbid(unsafe_code)]

//! Binding-expression language for ngl.
//!
//! Expressions found in bindings (`"count + 1"`, `"person.age += 1"`,
//! `"items[0].name"`) are interpreted against an [`Environment`] instead of
//! being executed as host code. The grammar is deliberately small:
//! literals, identifiers, member access, calls, unary and binary operators,
//! the conditional operator, assignment, and `;`-separated sequences.
//!
//! Every call to [`evaluate`] parses the source again; there is no cache.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::collections::HashMap;
//! use ngl_core::Value;
//! use ngl_expr::{Environment, evaluate};
//!
//! #[derive(Default)]
//! struct Vars(RefCell<HashMap<String, Value>>);
//!
//! impl Environment for Vars {
//!     fn lookup(&self, name: &str) -> Option<Value> {
//!         self.0.borrow().get(name).cloned()
//!     }
//!     fn assign(&self, name: &str, value: Value) {
//!         self.0.borrow_mut().insert(name.to_owned(), value);
//!     }
//! }
//!
//! let vars = Vars::default();
//! evaluate("bar = 1; bar += 2", &vars).unwrap();
//! assert_eq!(vars.lookup("bar"), Some(Value::from(3)));
//! assert!(evaluate("missing + 1", &vars).is_err());
//! ```

pub mod ast;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;

pub use ast::{AssignOp, BinaryOp, Expr, Literal, LogicalOp, Program, Property, UnaryOp};
pub use error::EvalError;
pub use interpreter::{Environment, Interpreter};
pub use parser::parse;

use ngl_core::Value;

/// Parse and evaluate `source` against `env`, returning the value of the
/// last statement (`Undefined` for empty input).
///
/// # Errors
///
/// Returns [`EvalError`] for syntax errors, unknown identifiers, and type
/// errors such as reading a member of `undefined`.
pub fn evaluate(source: &str, env: &dyn Environment) -> Result<Value, EvalError> {
    let program = parse(source)?;
    Interpreter::new(env).run(&program)
}

/// Assign `value` to the location named by `target` (an identifier or a
/// member expression such as `person.name`).
///
/// # Errors
///
/// Returns [`EvalError::Syntax`] when `target` is not a single assignable
/// expression, or the errors of evaluating the target's object part.
pub fn assign(target: &str, value: Value, env: &dyn Environment) -> Result<(), EvalError> {
    let program = parse(target)?;
    match program.statements.as_slice() {
        [expr] => Interpreter::new(env).assign_to(expr, value),
        _ => Err(EvalError::Syntax {
            offset: 0,
            message: "expected a single assignable expression".to_owned(),
        }),
    }
}
