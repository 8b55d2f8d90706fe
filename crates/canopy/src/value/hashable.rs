//! Hashing consistent with value equality
//!
//! Every variant can be a set element or dictionary key. Floats hash by a
//! normalised bit pattern so that `0.0` and `-0.0` collide; functions and
//! promises hash by identity; modules by name. Sets and dictionaries combine
//! element hashes with a commutative sum so insertion order does not matter.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::Value;

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hash the discriminant first
        std::mem::discriminant(self).hash(state);

        match self {
            Value::Unit => {}
            Value::Bool(b) => b.hash(state),
            Value::Byte(b) => b.hash(state),
            Value::Integer(n) => n.hash(state),
            Value::Float(n) => float_bits(*n).hash(state),
            Value::Char(c) => c.hash(state),
            Value::Symbol(s) => s.hash(state),
            Value::Sequence(seq) => {
                seq.len().hash(state);
                for item in seq.iter() {
                    item.hash(state);
                }
            }
            Value::Tuple(items) => items.hash(state),
            Value::Set(set) => {
                set.size().hash(state);
                unordered_hash(set.iter()).hash(state);
            }
            Value::Dict(dict) => {
                dict.size().hash(state);
                unordered_hash(dict.iter()).hash(state);
            }
            Value::Function(func) => (Arc::as_ptr(func) as usize).hash(state),
            Value::Module(module) => module.fqn().hash(state),
            Value::Promise(promise) => promise.id().hash(state),
        }
    }
}

impl Eq for Value {}

/// Bit pattern floats are hashed and compared by: every NaN is one value,
/// and `-0.0` is `0.0`.
pub(crate) fn float_bits(n: f64) -> u64 {
    if n.is_nan() {
        f64::NAN.to_bits()
    } else if n == 0.0 {
        0.0f64.to_bits()
    } else {
        n.to_bits()
    }
}

fn unordered_hash<T: Hash>(items: impl Iterator<Item = T>) -> u64 {
    items
        .map(|item| {
            let mut hasher = DefaultHasher::new();
            item.hash(&mut hasher);
            hasher.finish()
        })
        .fold(0u64, u64::wrapping_add)
}
