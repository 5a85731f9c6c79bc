#![forbid(unsafe_code)]

//! Structural equality and deep clone.
//!
//! The digest loop stores a deep clone of every watched value and compares
//! the next evaluation against it with [`equals`]; both functions together
//! define what counts as a change.
//!
//! # Invariants
//!
//! 1. `equals(a, a)` holds for every value, including `NaN`.
//! 2. `equals(a, &clone_value(a))` holds for every acyclic value.
//! 3. Members whose key starts with [`RESERVED_PREFIX`] are ignored on both
//!    sides, as are function-valued members.
//! 4. An extra significant member on either side makes two objects unequal.
//!
//! # Asymmetry
//!
//! [`equals`] skips function-valued members while [`clone_value`] copies them
//! (by reference). The two rules are kept separate on purpose; do not unify
//! them.
//!
//! # Failure Modes
//!
//! | Input | Behavior |
//! |-------|----------|
//! | Cyclic array/object | Unbounded recursion in both functions |
//! | Scope or global-environment object | Never structurally equal (identity only) |

use std::collections::HashSet;

use crate::value::{Array, Members, Object, Value};

/// Keys starting with this character are internal and skipped by [`equals`].
pub const RESERVED_PREFIX: char = '$';

/// Whether `key` is internal to the runtime.
#[must_use]
pub fn is_reserved_key(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX)
}

/// Whether `object` is a global-environment object, i.e. its `window`
/// member refers back to itself.
#[must_use]
pub fn is_global_env(object: &Object) -> bool {
    matches!(object.get("window"), Some(Value::Object(window)) if window.ptr_eq(object))
}

/// Structural equality between two values.
#[must_use]
pub fn equals(a: &Value, b: &Value) -> bool {
    if a.same_reference(b) {
        return true;
    }
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Number(x), Value::Number(y)) => x.is_nan() && y.is_nan(),
        (Value::Array(x), Value::Array(y)) => arrays_equal(x, y),
        (Value::Date(x), Value::Date(y)) => {
            equals(&Value::Number(*x), &Value::Number(*y))
        }
        (Value::Pattern(x), Value::Pattern(y)) => x.to_string() == y.to_string(),
        (Value::Object(x), Value::Object(y)) => objects_equal(x, y),
        _ => false,
    }
}

fn arrays_equal(left: &Array, right: &Array) -> bool {
    let left = left.borrow();
    let right = right.borrow();
    left.len() == right.len() && left.iter().zip(right.iter()).all(|(l, r)| equals(l, r))
}

fn objects_equal(left: &Object, right: &Object) -> bool {
    if is_global_env(left) || is_global_env(right) {
        return false;
    }

    let left_members = left.borrow();
    let mut visited: HashSet<&str> = HashSet::with_capacity(left_members.len());
    for (key, value) in left_members.iter() {
        if is_reserved_key(key) || value.is_function() {
            continue;
        }
        let other = right.get(key).unwrap_or_default();
        if !equals(value, &other) {
            return false;
        }
        visited.insert(key.as_str());
    }

    // Any significant key only present on the right breaks equality.
    right.borrow().iter().all(|(key, value)| {
        visited.contains(key.as_str())
            || is_reserved_key(key)
            || value.is_undefined()
            || value.is_function()
    })
}

/// Deep copy of arrays and objects; every other value is returned as is.
///
/// Function members are copied by reference rather than skipped. Dates,
/// patterns, scope handles and opaque values are returned unchanged.
#[must_use]
pub fn clone_value(value: &Value) -> Value {
    match value {
        Value::Array(items) => {
            Value::Array(items.borrow().iter().map(clone_value).collect::<Array>())
        }
        Value::Object(object) => {
            let members: Members = object
                .borrow()
                .iter()
                .map(|(key, member)| (key.clone(), clone_value(member)))
                .collect();
            Value::Object(Object::from_members(members))
        }
        other => other.clone(),
    }
}
