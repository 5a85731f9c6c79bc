#![forbid(unsafe_code)]

//! Core value model for the ngl binding runtime.
//!
//! - [`Value`]: the dynamically-typed value that scopes bind, expressions
//!   produce, and the container resolves.
//! - [`equals`] / [`clone_value`]: the structural equality and deep copy the
//!   digest loop relies on to detect changes.
//! - [`annotate_signature`]: recovers declared parameter names from
//!   signature text, used to build injectable [`Function`]s.
//!
//! # Architecture
//!
//! Composite values ([`Array`], [`Object`]) are `Rc<RefCell<..>>` handles, so
//! cloning a `Value` shares the underlying storage the same way two variables
//! can reference one object. Use [`clone_value`] for an independent copy.

pub mod convert;
pub mod equality;
pub mod signature;
pub mod value;

pub use convert::{
    format_number, is_truthy, loose_equals, strict_equals, to_display_string, to_number, type_name,
};
pub use equality::{clone_value, equals, is_global_env, is_reserved_key};
pub use signature::annotate_signature;
pub use value::{Array, Function, Members, Object, Opaque, Pattern, ScopeObject, ScopeRef, Value};

/// Build a [`Function`] whose declared parameter names are bound to closure
/// variables in order.
///
/// Each parameter is written `ident: "declared-name"`; the declared name is
/// what the container resolves, the identifier is what the body sees. The
/// body may evaluate to anything convertible into a [`Value`] (including `()`).
///
/// ```
/// use ngl_core::{factory, Value};
///
/// let add = factory!(|a: "left", b: "right"| {
///     ngl_core::to_number(&a) + ngl_core::to_number(&b)
/// });
/// assert_eq!(add.params(), ["left", "right"]);
/// assert_eq!(add.call(&[Value::from(2), Value::from(3)]), Value::from(5));
/// ```
#[macro_export]
macro_rules! factory {
    (|| $body:expr) => {{
        $crate::Function::new(::std::iter::empty::<&str>(), move |_: &[$crate::Value]| {
            $crate::Value::from($body)
        })
    }};
    (| $($param:ident : $name:literal),* $(,)? | $body:expr) => {{
        let params: &[&str] = &[$($name),*];
        $crate::Function::new(params.iter().copied(), move |args: &[$crate::Value]| {
            #[allow(unused_mut, unused_variables)]
            let mut remaining = args.iter();
            $(let $param: $crate::Value = remaining.next().cloned().unwrap_or_default();)*
            $crate::Value::from($body)
        })
    }};
}
