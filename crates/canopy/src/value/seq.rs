//! Persistent double-ended sequence

use rpds::ListSync;
use std::fmt;

use super::Value;

/// A persistent, ordered sequence with cheap cons at both ends.
///
/// Stored as two shared linked lists: `front` in order and `back` in
/// reverse order, so pushing or popping at either end touches only the head
/// of one list. Popping from an empty side reverses the other side once.
///
/// Text is a `Seq` of [`Value::Char`].
#[derive(Clone)]
pub struct Seq {
    front: ListSync<Value>,
    back: ListSync<Value>,
}

impl Seq {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self {
            front: ListSync::new_sync(),
            back: ListSync::new_sync(),
        }
    }

    /// Build a sequence of characters from a string.
    pub fn from_text(text: &str) -> Self {
        text.chars().map(Value::Char).collect()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.front.len() + self.back.len()
    }

    /// Whether the sequence has no elements.
    pub fn is_empty(&self) -> bool {
        self.front.is_empty() && self.back.is_empty()
    }

    /// New sequence with `value` prepended.
    pub fn push_front(&self, value: Value) -> Self {
        Self {
            front: self.front.push_front(value),
            back: self.back.clone(),
        }
    }

    /// New sequence with `value` appended.
    pub fn push_back(&self, value: Value) -> Self {
        Self {
            front: self.front.clone(),
            back: self.back.push_front(value),
        }
    }

    /// The first element.
    pub fn first(&self) -> Option<&Value> {
        self.front.first().or_else(|| self.back.last())
    }

    /// The last element.
    pub fn last(&self) -> Option<&Value> {
        self.back.first().or_else(|| self.front.last())
    }

    /// The sequence without its first element, or `None` when empty.
    pub fn drop_first(&self) -> Option<Self> {
        if let Some(front) = self.front.drop_first() {
            return Some(Self {
                front,
                back: self.back.clone(),
            });
        }
        self.back.reverse().drop_first().map(|front| Self {
            front,
            back: ListSync::new_sync(),
        })
    }

    /// The sequence without its last element, or `None` when empty.
    pub fn drop_last(&self) -> Option<Self> {
        if let Some(back) = self.back.drop_first() {
            return Some(Self {
                front: self.front.clone(),
                back,
            });
        }
        self.front.reverse().drop_first().map(|back| Self {
            front: ListSync::new_sync(),
            back,
        })
    }

    /// Element at `index`, counting from the front.
    pub fn get(&self, index: usize) -> Option<&Value> {
        let front_len = self.front.len();
        if index < front_len {
            return self.front.iter().nth(index);
        }
        let from_end = self.len().checked_sub(index + 1)?;
        self.back.iter().nth(from_end)
    }

    /// Iterate over the elements in order.
    pub fn iter(&self) -> impl Iterator<Item = &Value> + '_ {
        let back: Vec<&Value> = self.back.iter().collect();
        self.front.iter().chain(back.into_iter().rev())
    }

    /// Concatenate two sequences.
    pub fn concat(&self, other: &Seq) -> Self {
        other
            .iter()
            .fold(self.clone(), |seq, value| seq.push_back(value.clone()))
    }

    /// Whether any element equals `needle`.
    pub fn contains(&self, needle: &Value) -> bool {
        self.iter().any(|value| value == needle)
    }

    /// Render as a Rust string if every element is a character.
    pub fn as_string(&self) -> Option<String> {
        self.iter()
            .map(|value| match value {
                Value::Char(c) => Some(*c),
                _ => None,
            })
            .collect()
    }
}

impl Default for Seq {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Value> for Seq {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let items: Vec<Value> = iter.into_iter().collect();
        let mut front = ListSync::new_sync();
        for value in items.into_iter().rev() {
            front.push_front_mut(value);
        }
        Self {
            front,
            back: ListSync::new_sync(),
        }
    }
}

impl PartialEq for Seq {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl fmt::Debug for Seq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
