//! Identifier interning.
//!
//! Every identifier in the declaration arena is stored as an `Atom`, a
//! `u32` handle into the owning `Interner`. Comparing atoms is a single
//! integer compare, which keeps name lookup and the capability gate cheap.

use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Interned string handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// The empty string is always interned first.
    pub const EMPTY: Self = Self(0);
}

/// Owns the text of every interned identifier.
#[derive(Debug, Clone)]
pub struct Interner {
    map: FxHashMap<Arc<str>, Atom>,
    strings: Vec<Arc<str>>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    #[must_use]
    pub fn new() -> Self {
        let mut interner = Self {
            map: FxHashMap::default(),
            strings: Vec::new(),
        };
        interner.intern("");
        interner
    }

    /// Intern `text`, returning the existing atom when already present.
    pub fn intern(&mut self, text: &str) -> Atom {
        if let Some(&atom) = self.map.get(text) {
            return atom;
        }
        let atom = Atom(self.strings.len() as u32);
        let shared: Arc<str> = Arc::from(text);
        self.strings.push(Arc::clone(&shared));
        self.map.insert(shared, atom);
        atom
    }

    /// Look up an already-interned string without inserting it.
    #[must_use]
    pub fn get(&self, text: &str) -> Option<Atom> {
        self.map.get(text).copied()
    }

    #[must_use]
    pub fn resolve(&self, atom: Atom) -> &str {
        self.strings
            .get(atom.0 as usize)
            .map(|s| &**s)
            .unwrap_or("")
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        // The empty string is always present.
        self.strings.len() <= 1
    }
}
