#![forbid(unsafe_code)]

//! The dynamically-typed [`Value`] shared by scopes, expressions and the
//! container.
//!
//! # Invariants
//!
//! 1. Cloning a `Value` never copies composite storage: [`Array`] and
//!    [`Object`] clones alias the same cells.
//! 2. Reference identity (`ptr_eq`) is defined for arrays, objects,
//!    functions, scope handles and opaque host values; all other variants
//!    are plain data.
//! 3. Object keys keep insertion order.

use std::any::Any;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::convert;

/// Ordered key/value storage of an [`Object`].
pub type Members = IndexMap<String, Value>;

/// A runtime value.
#[derive(Clone, Default)]
pub enum Value {
    /// The absent value produced by failed lookups and evaluations.
    #[default]
    Undefined,
    /// The explicit null value returned for unregistered dependencies.
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(Array),
    Object(Object),
    Function(Function),
    /// Date-like value, milliseconds since the Unix epoch.
    Date(f64),
    /// Regular-expression-like value, compared by textual form.
    Pattern(Pattern),
    /// Handle to a binding context.
    Scope(ScopeRef),
    /// Host value with identity-only semantics.
    Opaque(Opaque),
}

impl Value {
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn is_function(&self) -> bool {
        matches!(self, Self::Function(_))
    }

    /// Truthiness as used by conditionals and local-binding overrides.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        convert::is_truthy(self)
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Build a pattern value from its source and flags.
    #[must_use]
    pub fn pattern(source: &str, flags: &str) -> Self {
        Self::Pattern(Pattern::new(source, flags))
    }

    /// Wrap an arbitrary host value.
    #[must_use]
    pub fn opaque<T: Any>(value: T) -> Self {
        Self::Opaque(Opaque::new(value))
    }

    /// `true` when both values are the very same composite (or the same
    /// scalar), the way `===` behaves on references.
    #[must_use]
    pub fn same_reference(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => a.ptr_eq(b),
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Function(a), Self::Function(b)) => a.ptr_eq(b),
            (Self::Scope(a), Self::Scope(b)) => a.ptr_eq(b),
            (Self::Opaque(a), Self::Opaque(b)) => a.ptr_eq(b),
            _ => convert::strict_equals(self, other),
        }
    }
}

/// Strict (`===`) equality; composites compare by identity.
///
/// Use [`equals`](crate::equals) for structural comparison.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        convert::strict_equals(self, other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&convert::format_number(*n)),
            Self::String(s) => write!(f, "{:?}", &**s),
            Self::Array(a) => f.debug_list().entries(a.borrow().iter()).finish(),
            Self::Object(o) => f.debug_map().entries(o.borrow().iter()).finish(),
            Self::Function(func) => write!(f, "function({})", func.params().join(", ")),
            Self::Date(ms) => write!(f, "Date({})", convert::format_number(*ms)),
            Self::Pattern(p) => write!(f, "{p}"),
            Self::Scope(s) => write!(f, "{s:?}"),
            Self::Opaque(o) => write!(f, "{o:?}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&convert::to_display_string(self))
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Undefined
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(Rc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(Array::from_vec(items))
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Self::Array(a)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Self::Object(o)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Self::Function(f)
    }
}

impl From<Pattern> for Value {
    fn from(p: Pattern) -> Self {
        Self::Pattern(p)
    }
}

impl From<ScopeRef> for Value {
    fn from(s: ScopeRef) -> Self {
        Self::Scope(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Array
// ---------------------------------------------------------------------------

/// Shared, mutable, ordered sequence.
#[derive(Clone, Default)]
pub struct Array {
    items: Rc<RefCell<Vec<Value>>>,
}

impl Array {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_vec(items: Vec<Value>) -> Self {
        Self {
            items: Rc::new(RefCell::new(items)),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.items.borrow().get(index).cloned()
    }

    /// Store `value` at `index`, padding any gap with `Undefined`.
    pub fn set(&self, index: usize, value: Value) {
        let mut items = self.items.borrow_mut();
        if index >= items.len() {
            items.resize(index + 1, Value::Undefined);
        }
        items[index] = value;
    }

    pub fn push(&self, value: Value) {
        self.items.borrow_mut().push(value);
    }

    /// Borrow the elements. Do not hold the guard across calls that may
    /// mutate this array.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, Vec<Value>> {
        self.items.borrow()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.items.borrow().clone()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.items, &other.items)
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

/// Shared, mutable key/value record with insertion-ordered keys.
#[derive(Clone, Default)]
pub struct Object {
    members: Rc<RefCell<Members>>,
}

impl Object {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_members(members: Members) -> Self {
        Self {
            members: Rc::new(RefCell::new(members)),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.members.borrow().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.members.borrow_mut().insert(key.into(), value.into());
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.members.borrow_mut().shift_remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.members.borrow().contains_key(key)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.members.borrow().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.borrow().is_empty()
    }

    /// Borrow the members. Do not hold the guard across calls that may
    /// mutate this object.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, Members> {
        self.members.borrow()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.members, &other.members)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_members(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// Function
// ---------------------------------------------------------------------------

type NativeFn = dyn Fn(&[Value]) -> Value;

/// A callable value with an ordered list of declared parameter names.
///
/// The parameter names are what the container resolves when the function is
/// used as a factory; positional calls ignore them.
#[derive(Clone)]
pub struct Function {
    params: Rc<[String]>,
    body: Rc<NativeFn>,
}

impl Function {
    /// Create a function with explicitly declared parameter names.
    pub fn new<I, S>(params: I, body: impl Fn(&[Value]) -> Value + 'static) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            params: params.into_iter().map(Into::into).collect(),
            body: Rc::new(body),
        }
    }

    /// Create a function whose parameter names are read from signature text
    /// such as `"function ($scope, /* shared */ taskService)"`.
    pub fn from_signature(signature: &str, body: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Self::new(crate::annotate_signature(signature), body)
    }

    /// Declared parameter names, in declaration order.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.body)(args)
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.body, &other.body)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Pattern
// ---------------------------------------------------------------------------

/// Regular-expression-like value. Only its textual form matters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    source: Rc<str>,
    flags: Rc<str>,
}

impl Pattern {
    #[must_use]
    pub fn new(source: &str, flags: &str) -> Self {
        Self {
            source: Rc::from(source),
            flags: Rc::from(flags),
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn flags(&self) -> &str {
        &self.flags
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

// ---------------------------------------------------------------------------
// Scope handles
// ---------------------------------------------------------------------------

/// Binding context that can be carried inside a [`Value`].
///
/// Implemented by the runtime's scope type; expressions use it to read and
/// write members of a scope value (`$scope.x`).
pub trait ScopeObject: Any {
    fn scope_id(&self) -> u64;

    /// Resolve `name`, delegating to ancestors when it is not bound locally.
    fn lookup(&self, name: &str) -> Option<Value>;

    /// Bind `name` locally.
    fn assign(&self, name: &str, value: Value);

    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

/// Shared handle to a [`ScopeObject`].
#[derive(Clone)]
pub struct ScopeRef(Rc<dyn ScopeObject>);

impl ScopeRef {
    #[must_use]
    pub fn new(scope: Rc<dyn ScopeObject>) -> Self {
        Self(scope)
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.0.scope_id()
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.0.lookup(name)
    }

    pub fn assign(&self, name: &str, value: Value) {
        self.0.assign(name, value);
    }

    /// Recover the concrete scope type.
    #[must_use]
    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        Rc::clone(&self.0).into_any().downcast::<T>().ok()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ScopeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scope(#{})", self.id())
    }
}

// ---------------------------------------------------------------------------
// Opaque host values
// ---------------------------------------------------------------------------

/// Host value stored in a [`Value`] without structural semantics.
#[derive(Clone)]
pub struct Opaque(Rc<dyn Any>);

impl Opaque {
    #[must_use]
    pub fn new<T: Any>(value: T) -> Self {
        Self(Rc::new(value))
    }

    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Opaque")
    }
}
