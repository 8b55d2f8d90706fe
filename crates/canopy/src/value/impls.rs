//! Value implementations: constructors, predicates, extractors, and equality

use std::sync::Arc;

use super::collections::{dict_from, set_from};
use super::hashable::float_bits;
use super::*;

impl Value {
    // ═══════════════════════════════════════════════════════════════════
    // Constructors
    // ═══════════════════════════════════════════════════════════════════

    /// Create a text value (a sequence of characters).
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Sequence(Seq::from_text(s.as_ref()))
    }

    /// Create an interned symbol.
    pub fn symbol(name: &str) -> Self {
        Value::Symbol(Symbol::intern(name))
    }

    /// Create a sequence from elements.
    pub fn sequence(items: Vec<Value>) -> Self {
        Value::Sequence(items.into_iter().collect())
    }

    /// Create a tuple from elements.
    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Arc::new(items))
    }

    /// Create a set from elements; duplicates collapse.
    pub fn set(items: Vec<Value>) -> Self {
        Value::Set(set_from(items))
    }

    /// Create a dictionary from pairs; later keys win.
    pub fn dict(pairs: Vec<(Value, Value)>) -> Self {
        Value::Dict(dict_from(pairs))
    }

    /// Wrap a function.
    pub fn function(func: FunctionValue) -> Self {
        Value::Function(Arc::new(func))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Type Predicates
    // ═══════════════════════════════════════════════════════════════════

    /// Check if this is the unit value.
    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }

    /// Check if this is a pending or settled promise.
    pub fn is_promise(&self) -> bool {
        matches!(self, Value::Promise(_))
    }

    /// Check if this is a text sequence.
    pub fn is_string(&self) -> bool {
        matches!(self, Value::Sequence(seq) if seq.as_string().is_some())
    }

    /// Check if this value can be called.
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Value Extraction
    // ═══════════════════════════════════════════════════════════════════

    /// Try to extract a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to extract an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to extract text.
    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Sequence(seq) => seq.as_string(),
            _ => None,
        }
    }

    /// Try to borrow a sequence.
    pub fn as_seq(&self) -> Option<&Seq> {
        match self {
            Value::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    /// Try to borrow tuple elements.
    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Take the elements of a tuple, cloning only if they are shared.
    pub fn into_elements(self) -> Option<Vec<Value>> {
        match self {
            Value::Tuple(items) => Some(Arc::try_unwrap(items).unwrap_or_else(|shared| (*shared).clone())),
            _ => None,
        }
    }

    /// Number of elements in a tuple, sequence, set, or dictionary.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Tuple(items) => Some(items.len()),
            Value::Sequence(seq) => Some(seq.len()),
            Value::Set(set) => Some(set.size()),
            Value::Dict(dict) => Some(dict.size()),
            _ => None,
        }
    }

    /// Element `index` of a tuple or sequence.
    pub fn element(&self, index: usize) -> Option<&Value> {
        match self {
            Value::Tuple(items) => items.get(index),
            Value::Sequence(seq) => seq.get(index),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// PartialEq Implementation
// ═══════════════════════════════════════════════════════════════════════

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_bits(*a) == float_bits(*b),
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Module(a), Value::Module(b)) => a.fqn() == b.fqn(),
            (Value::Promise(a), Value::Promise(b)) => a.ptr_eq(b),
            // Different variants are never equal
            _ => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// From Implementations
// ═══════════════════════════════════════════════════════════════════════

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<u8> for Value {
    fn from(n: u8) -> Self {
        Value::Byte(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Value::Symbol(s)
    }
}

impl From<Seq> for Value {
    fn from(seq: Seq) -> Self {
        Value::Sequence(seq)
    }
}

impl From<Promise> for Value {
    fn from(promise: Promise) -> Self {
        Value::Promise(promise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_is_char_sequence() {
        let s = Value::string("ab");
        assert!(s.is_string());
        assert_eq!(
            s,
            Value::sequence(vec![Value::Char('a'), Value::Char('b')])
        );
        assert_eq!(s.as_string(), Some("ab".to_string()));
    }

    #[test]
    fn test_empty_sequence_is_text() {
        assert!(Value::string("").is_string());
    }

    #[test]
    fn test_cross_variant_inequality() {
        assert_ne!(Value::Integer(1), Value::Float(1.0));
        assert_ne!(Value::Integer(1), Value::Byte(1));
        assert_ne!(Value::tuple(vec![]), Value::sequence(vec![]));
    }

    #[test]
    fn test_into_elements() {
        let tuple = Value::tuple(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(
            tuple.into_elements(),
            Some(vec![Value::Integer(1), Value::Integer(2)])
        );
        assert_eq!(Value::Unit.into_elements(), None);
    }

    #[test]
    fn test_len_and_element() {
        let seq = Value::sequence(vec![Value::Integer(7), Value::Integer(8)]);
        assert_eq!(seq.len(), Some(2));
        assert_eq!(seq.element(1), Some(&Value::Integer(8)));
        assert_eq!(Value::Integer(3).len(), None);
    }

    #[test]
    fn test_set_dedup() {
        let set = Value::set(vec![Value::Integer(1), Value::Integer(1)]);
        assert_eq!(set.len(), Some(1));
    }
}
