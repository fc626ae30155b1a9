//! Keys and values stored in tables.

use crate::arena::TableId;
use core::any::Any;
use core::fmt;
use std::sync::Arc;

/// A table key.
///
/// The derived `Ord` is the canonical key order: strings first (by bytes),
/// then integers, then booleans. Variant order matters; do not reorder.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Str(Arc<str>),
    Int(i64),
    Bool(bool),
}

impl Key {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Key::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(Arc::from(s))
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(Arc::from(s))
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

impl From<i32> for Key {
    fn from(i: i32) -> Self {
        Key::Int(i64::from(i))
    }
}

impl From<bool> for Key {
    fn from(b: bool) -> Self {
        Key::Bool(b)
    }
}

/// A reference to something the engine cannot look inside (a function, a
/// host object). Compared and hashed by pointer identity only.
#[derive(Clone)]
pub struct Opaque {
    kind: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
    pub fn new<T: Any + Send + Sync>(kind: &'static str, payload: T) -> Self {
        Self {
            kind,
            inner: Arc::new(payload),
        }
    }

    /// Wraps a callable as an opaque `function` value.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        let boxed: Box<dyn Fn(&[Value]) -> Value + Send + Sync> = Box::new(f);
        Self::new("function", boxed)
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }

    pub fn ptr_eq(&self, other: &Opaque) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Address of the shared payload; stable for the payload's lifetime.
    pub fn address(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: 0x{:x}", self.kind, self.address())
    }
}

/// Any value a table slot can hold.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Table(TableId),
    Opaque(Opaque),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    pub const fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub const fn is_table(&self) -> bool {
        matches!(self, Value::Table(_))
    }

    pub const fn as_table(&self) -> Option<TableId> {
        match self {
            Value::Table(id) => Some(*id),
            _ => None,
        }
    }

    /// Dynamic type category. Integers and floats share `number`; opaque
    /// values report their own kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::Float(_) => "number",
            Value::Str(_) => "string",
            Value::Table(_) => "table",
            Value::Opaque(o) => o.kind(),
        }
    }

    /// Primitive equality: numbers by numeric value, strings by content,
    /// tables and opaque values by identity.
    pub fn raw_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => {
                int_eq_float(*i, *f)
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

fn int_eq_float(i: i64, f: f64) -> bool {
    // Compare in the integer domain; `i as f64` would round large integers.
    const TWO_63: f64 = 9_223_372_036_854_775_808.0;
    f.fract() == 0.0 && (-TWO_63..TWO_63).contains(&f) && f as i64 == i
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.raw_eq(other)
    }
}

impl From<&Key> for Value {
    fn from(key: &Key) -> Self {
        match key {
            Key::Str(s) => Value::Str(s.clone()),
            Key::Int(i) => Value::Int(*i),
            Key::Bool(b) => Value::Bool(*b),
        }
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        Value::from(&key)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<TableId> for Value {
    fn from(id: TableId) -> Self {
        Value::Table(id)
    }
}

impl From<Opaque> for Value {
    fn from(o: Opaque) -> Self {
        Value::Opaque(o)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: canonical key order is strings, then integers, then booleans.
    #[test]
    fn key_order_groups_by_kind() {
        let mut keys = vec![
            Key::Bool(true),
            Key::Int(3),
            Key::from("b"),
            Key::Int(-1),
            Key::Bool(false),
            Key::from("a"),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                Key::from("a"),
                Key::from("b"),
                Key::Int(-1),
                Key::Int(3),
                Key::Bool(false),
                Key::Bool(true),
            ]
        );
    }

    /// Invariant: integers and floats are the same type and compare numerically.
    #[test]
    fn numbers_compare_across_representations() {
        assert_eq!(Value::Int(2).type_name(), Value::Float(2.5).type_name());
        assert!(Value::Int(2).raw_eq(&Value::Float(2.0)));
        assert!(!Value::Int(2).raw_eq(&Value::Float(2.5)));
        assert!(!Value::Float(f64::NAN).raw_eq(&Value::Float(f64::NAN)));
        assert!(!Value::Int(i64::MAX).raw_eq(&Value::Float(i64::MAX as f64)));
    }

    /// Invariant: opaque values are equal only to clones of the same payload.
    #[test]
    fn opaque_identity() {
        let f = Opaque::function(|_| Value::Nil);
        let g = Opaque::function(|_| Value::Nil);
        assert!(Value::from(f.clone()).raw_eq(&Value::from(f.clone())));
        assert!(!Value::from(f.clone()).raw_eq(&Value::from(g)));
        assert_eq!(Value::from(f).type_name(), "function");
    }

    #[test]
    fn mismatched_types_are_unequal() {
        assert!(!Value::str("1").raw_eq(&Value::Int(1)));
        assert!(!Value::Nil.raw_eq(&Value::Bool(false)));
    }
}
