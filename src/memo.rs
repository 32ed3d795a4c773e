//! Array identities and operation-scoped memoization tables.
//!
//! Arrays in a dataset can be shared: two fields may hold the same [`crate::array::ArrayRef`],
//! and a position array may hold a nested time array which is also the dataset's time field.
//! Structural operations (insert, subset) and persistence (write, read) must keep those
//! relationships intact, which means every change of a shared array is carried out exactly
//! once per operation and every reference to it resolves to the same replacement.
//!
//! The bookkeeping is explicit. Every array receives an [`ArrayId`] when it is created, and a
//! [`Memo`] maps keys to already-produced results for the duration of one top-level
//! operation. Three instantiations exist:
//!
//! - [`MutationMemo`] - a [`Mutation`] applied to an original array to its result
//! - [`WriteMemo`] - `ArrayId` to the `fieldname` of the group holding the physical copy
//! - [`ReadMemo`] - `fieldname` to the array materialized from that group
//!
//! The write and read memos bridge identity and name: the writer records where an array was
//! written, and emits a `reference` attribute carrying that name for every later alias. The
//! reader resolves those references through the name-keyed memo.
//!
//! A memo is created by the caller driving the operation and dropped when that operation
//! completes, so identities never leak between operations.

use std::{
    collections::HashMap,
    fmt,
    hash::Hash,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::array::ArrayRef;

static NEXT_ARRAY_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of one array instance.
///
/// Ids are handed out from a process-wide counter and never reused, so an id that is not
/// present in a memo can never be confused with another array, even after the original
/// array was dropped.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArrayId(u64);

impl ArrayId {
    /// Allocates a fresh id
    #[must_use]
    pub fn next() -> Self {
        ArrayId(NEXT_ARRAY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ArrayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArrayId({})", self.0)
    }
}

impl fmt::Display for ArrayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An already-processed map, valid for one top-level operation.
pub struct Memo<K, V> {
    entries: HashMap<K, V>,
}

impl<K: Eq + Hash, V> Memo<K, V> {
    /// Creates an empty memo
    #[must_use]
    pub fn new() -> Self {
        Memo {
            entries: HashMap::new(),
        }
    }

    /// Returns the recorded result for `key`
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Records the result for `key`, returning the previous one
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    /// Number of recorded results
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was recorded yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V> fmt::Debug for Memo<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// One structural change of an array, the key of a [`MutationMemo`].
///
/// A shared array changed the same way twice in one operation yields one shared result.
/// Changed in different ways, for example extended by two different sources, it yields
/// separate results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutation {
    /// Subset of `target`; the indices are fixed for one operation
    Subset(ArrayId),
    /// `source` spliced into `target` before observation `position`
    Insert {
        /// Array being grown
        target: ArrayId,
        /// Insertion point
        position: usize,
        /// Array providing the new observations
        source: ArrayId,
    },
    /// `num_obs` empty observations spliced into `target` before observation `position`
    Pad {
        /// Array being grown
        target: ArrayId,
        /// Insertion point
        position: usize,
        /// Number of empty observations
        num_obs: usize,
    },
}

/// Mutation of an original array to its result within one insert/subset chain
pub type MutationMemo = Memo<Mutation, ArrayRef>;

/// Array identity to the `fieldname` of the group it was physically written to
pub type WriteMemo = Memo<ArrayId, String>;

/// `fieldname` to the array materialized from that group
pub type ReadMemo = Memo<String, ArrayRef>;
