//! Persistent set and dictionary algebra

use rpds::{HashTrieMapSync, HashTrieSetSync};

use super::Value;

/// Persistent hash set of values.
pub type Set = HashTrieSetSync<Value>;

/// Persistent hash map from values to values.
pub type Dict = HashTrieMapSync<Value, Value>;

/// Build a set from values, dropping duplicates.
pub(crate) fn set_from(values: impl IntoIterator<Item = Value>) -> Set {
    let mut set = Set::new_sync();
    for value in values {
        set.insert_mut(value);
    }
    set
}

/// Build a dictionary from pairs; later pairs win.
pub(crate) fn dict_from(pairs: impl IntoIterator<Item = (Value, Value)>) -> Dict {
    let mut dict = Dict::new_sync();
    for (key, value) in pairs {
        dict.insert_mut(key, value);
    }
    dict
}

// ═══════════════════════════════════════════════════════════════════════
// Sets
// ═══════════════════════════════════════════════════════════════════════

pub(crate) fn set_union(left: &Set, right: &Set) -> Set {
    let mut result = left.clone();
    for value in right.iter() {
        result.insert_mut(value.clone());
    }
    result
}

pub(crate) fn set_intersection(left: &Set, right: &Set) -> Set {
    set_from(left.iter().filter(|v| right.contains(*v)).cloned())
}

pub(crate) fn set_symmetric_difference(left: &Set, right: &Set) -> Set {
    let only_left = left.iter().filter(|v| !right.contains(*v));
    let only_right = right.iter().filter(|v| !left.contains(*v));
    set_from(only_left.chain(only_right).cloned())
}

// ═══════════════════════════════════════════════════════════════════════
// Dictionaries
// ═══════════════════════════════════════════════════════════════════════

/// Union of keys; on a shared key the left value wins.
pub(crate) fn dict_union(left: &Dict, right: &Dict) -> Dict {
    let mut result = left.clone();
    for (key, value) in right.iter() {
        if !result.contains_key(key) {
            result.insert_mut(key.clone(), value.clone());
        }
    }
    result
}

/// Keys present in both, carrying the left value.
pub(crate) fn dict_intersection(left: &Dict, right: &Dict) -> Dict {
    dict_from(
        left.iter()
            .filter(|(key, _)| right.contains_key(*key))
            .map(|(key, value)| (key.clone(), value.clone())),
    )
}

/// Keys present in exactly one dictionary, each with that dictionary's value.
pub(crate) fn dict_symmetric_difference(left: &Dict, right: &Dict) -> Dict {
    let only_left = left.iter().filter(|(key, _)| !right.contains_key(*key));
    let only_right = right.iter().filter(|(key, _)| !left.contains_key(*key));
    dict_from(
        only_left
            .chain(only_right)
            .map(|(key, value)| (key.clone(), value.clone())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ints(items: &[i64]) -> Set {
        set_from(items.iter().map(|&i| Value::Integer(i)))
    }

    fn dict(pairs: &[(i64, &str)]) -> Dict {
        dict_from(
            pairs
                .iter()
                .map(|&(k, v)| (Value::Integer(k), Value::string(v))),
        )
    }

    #[test]
    fn test_set_algebra() {
        let a = ints(&[1, 2, 3]);
        let b = ints(&[3, 4]);
        assert_eq!(set_union(&a, &b), ints(&[1, 2, 3, 4]));
        assert_eq!(set_intersection(&a, &b), ints(&[3]));
        assert_eq!(set_symmetric_difference(&a, &b), ints(&[1, 2, 4]));
    }

    #[test]
    fn test_set_from_drops_duplicates() {
        assert_eq!(ints(&[1, 1, 2]).size(), 2);
    }

    #[test]
    fn test_dict_union_left_wins() {
        let left = dict(&[(1, "left")]);
        let right = dict(&[(1, "right"), (2, "two")]);
        assert_eq!(dict_union(&left, &right), dict(&[(1, "left"), (2, "two")]));
    }

    #[test]
    fn test_dict_intersection_keeps_left_values() {
        let left = dict(&[(1, "a"), (2, "b")]);
        let right = dict(&[(2, "z"), (3, "c")]);
        assert_eq!(dict_intersection(&left, &right), dict(&[(2, "b")]));
    }

    #[test]
    fn test_dict_symmetric_difference_keeps_origin_values() {
        let left = dict(&[(1, "a"), (2, "b")]);
        let right = dict(&[(2, "z"), (3, "c")]);
        assert_eq!(
            dict_symmetric_difference(&left, &right),
            dict(&[(1, "a"), (3, "c")])
        );
    }
}
