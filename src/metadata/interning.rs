//! Interning of type and method symbols.
//!
//! The [`InternTable`] assigns a small integer key to every distinct [`Symbol`]
//! the first time it is observed. Keys allow O(1) identity comparison of method
//! and type references in place of deep structural comparison, which is what the
//! symbol-directed rewriter uses to match call sites against its signature table.
//!
//! # Guarantees
//!
//! - The same symbol always yields the same key, regardless of which thread asks first.
//! - Two distinct symbols never share a key.
//! - Keys are monotonic and never reassigned or reused; `0` is never handed out.
//!
//! # Architecture
//!
//! The table is an explicit service instance rather than ambient global state:
//! every component that needs keys receives an `Arc<InternTable>`. Forward lookups
//! go through a `DashMap` whose entry API provides the insert-if-absent guarantee,
//! reverse lookups through a `SkipMap` ordered by key.
//!
//! ```rust
//! use dotmutate::metadata::identity::{AssemblyIdentity, AssemblyVersion};
//! use dotmutate::metadata::interning::InternTable;
//! use dotmutate::metadata::references::TypeReference;
//!
//! let table = InternTable::new();
//! let corlib = AssemblyIdentity::new("mscorlib", AssemblyVersion::new(4, 0, 0, 0), "", vec![]);
//! let string = TypeReference::new(corlib, "System", "String");
//!
//! let first = table.intern_type(&string);
//! assert_eq!(table.intern_type(&string.clone()), first);
//! ```

use std::{
    fmt,
    sync::atomic::{AtomicU32, Ordering},
};

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;

use crate::metadata::references::{MethodReference, TypeReference};

/// A process-lifetime key assigned to one symbol by an [`InternTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InternedKey(u32);

impl InternedKey {
    /// The raw key value.
    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for InternedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A logical symbol that can be interned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// A type reference
    Type(TypeReference),
    /// A method reference
    Method(MethodReference),
}

/// Thread-safe, append-only symbol interning table.
pub struct InternTable {
    keys: DashMap<Symbol, InternedKey>,
    symbols: SkipMap<InternedKey, Symbol>,
    next_key: AtomicU32,
}

impl Default for InternTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InternTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: DashMap::new(),
            symbols: SkipMap::new(),
            next_key: AtomicU32::new(1),
        }
    }

    /// Returns the key of `symbol`, assigning a fresh one on first sight.
    pub fn intern(&self, symbol: &Symbol) -> InternedKey {
        if let Some(key) = self.keys.get(symbol) {
            return *key;
        }

        // The entry holds the shard lock, so exactly one caller assigns the key.
        *self.keys.entry(symbol.clone()).or_insert_with(|| {
            let key = InternedKey(self.next_key.fetch_add(1, Ordering::Relaxed));
            self.symbols.insert(key, symbol.clone());
            key
        })
    }

    /// Returns the key of a type reference.
    pub fn intern_type(&self, reference: &TypeReference) -> InternedKey {
        self.intern(&Symbol::Type(reference.clone()))
    }

    /// Returns the key of a method reference.
    pub fn intern_method(&self, reference: &MethodReference) -> InternedKey {
        self.intern(&Symbol::Method(reference.clone()))
    }

    /// Returns the key of `symbol` without assigning one.
    pub fn get(&self, symbol: &Symbol) -> Option<InternedKey> {
        self.keys.get(symbol).map(|key| *key)
    }

    /// Returns the symbol a key was assigned to.
    pub fn lookup(&self, key: InternedKey) -> Option<Symbol> {
        self.symbols.get(&key).map(|entry| entry.value().clone())
    }

    /// Number of interned symbols.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if nothing has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for InternTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InternTable")
            .field("len", &self.len())
            .finish()
    }
}
