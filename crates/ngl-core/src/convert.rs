//! Primitive conversions shared by the interpreter and the binding layer.
//!
//! These follow the familiar scripting-language rules: empty strings, zero,
//! `NaN`, `null` and `undefined` are falsy; numbers print without a trailing
//! `.0` when integral.

use crate::value::Value;

/// Truthiness of a value.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Undefined | Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Numeric conversion. Unparseable input yields `NaN`.
#[must_use]
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Undefined => f64::NAN,
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) | Value::Date(n) => *n,
        Value::String(s) => parse_number(s),
        Value::Array(_) => parse_number(&to_display_string(value)),
        _ => f64::NAN,
    }
}

fn parse_number(text: &str) -> f64 {
    let text = text.trim();
    match text {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust accepts spellings like "inf" and "nan" that should not parse.
        _ if text.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => f64::NAN,
        _ => text.parse().unwrap_or(f64::NAN),
    }
}

/// Render a number the way it appears in text bindings.
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_owned()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if n == 0.0 {
        // Covers -0.0, which `{:.0}` would print with a sign.
        "0".to_owned()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

/// String conversion used for concatenation, property keys and text output.
#[must_use]
pub fn to_display_string(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".to_owned(),
        Value::Null => "null".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => s.to_string(),
        Value::Array(items) => items
            .borrow()
            .iter()
            .map(|item| match item {
                Value::Undefined | Value::Null => String::new(),
                other => to_display_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_owned(),
        Value::Function(f) => format!("function ({})", f.params().join(", ")),
        Value::Date(ms) => format_number(*ms),
        Value::Pattern(p) => p.to_string(),
        Value::Scope(s) => format!("[object Scope #{}]", s.id()),
        Value::Opaque(_) => "[object Opaque]".to_owned(),
    }
}

/// Result of the `typeof` operator.
#[must_use]
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Undefined => "undefined",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Function(_) => "function",
        Value::Null
        | Value::Array(_)
        | Value::Object(_)
        | Value::Date(_)
        | Value::Pattern(_)
        | Value::Scope(_)
        | Value::Opaque(_) => "object",
    }
}

/// Strict equality (`===`): no coercion, composites by identity, `NaN`
/// unequal to itself.
#[must_use]
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) | (Value::Date(x), Value::Date(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Pattern(x), Value::Pattern(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => x.ptr_eq(y),
        (Value::Object(x), Value::Object(y)) => x.ptr_eq(y),
        (Value::Function(x), Value::Function(y)) => x.ptr_eq(y),
        (Value::Scope(x), Value::Scope(y)) => x.ptr_eq(y),
        (Value::Opaque(x), Value::Opaque(y)) => x.ptr_eq(y),
        _ => false,
    }
}

/// Loose equality (`==`): `null == undefined`, and numbers, strings and
/// booleans compare after numeric conversion.
#[must_use]
pub fn loose_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
        (Value::Number(_) | Value::String(_) | Value::Bool(_), Value::Bool(_))
        | (Value::Bool(_), Value::Number(_) | Value::String(_))
        | (Value::Number(_), Value::String(_))
        | (Value::String(_), Value::Number(_)) => to_number(a) == to_number(b),
        _ => strict_equals(a, b),
    }
}
