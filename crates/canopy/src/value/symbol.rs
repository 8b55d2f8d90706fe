//! Interned symbols

use dashmap::DashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

/// Process-wide symbol table.
fn table() -> &'static DashMap<Arc<str>, ()> {
    static TABLE: OnceLock<DashMap<Arc<str>, ()>> = OnceLock::new();
    TABLE.get_or_init(DashMap::new)
}

/// An interned name tag such as `:ok` or `:nomatch`.
///
/// Interning makes equal symbols share one allocation, so equality is
/// usually a pointer comparison.
#[derive(Clone)]
pub struct Symbol(Arc<str>);

impl Symbol {
    /// Intern `name` and return its symbol.
    pub fn intern(name: &str) -> Self {
        let table = table();
        if let Some(entry) = table.get(name) {
            return Symbol(Arc::clone(entry.key()));
        }
        let entry = table.entry(Arc::from(name)).or_insert(());
        Symbol(Arc::clone(entry.key()))
    }

    /// The symbol's name without the leading colon.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol::intern(name)
    }
}
