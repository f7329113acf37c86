//! Namespace state: an identifier plus the set of claimed keys

use super::address::NamespaceId;
use super::key::SlotKey;
use std::collections::HashSet;

/// A parent scope under which keys are unique.
///
/// Holds no payloads. The presence of a key in the claimed set is the whole
/// claim record. Mutation goes through the allocator functions, which take
/// the namespace by `&mut` so no two claims on it can interleave.
#[derive(Debug, Clone)]
pub struct Namespace {
    id: NamespaceId,
    claimed: HashSet<SlotKey>,
}

impl Namespace {
    /// Create an empty namespace with a fresh random id
    pub fn new() -> Self {
        Self::with_id(NamespaceId::new())
    }

    /// Create an empty namespace with a known id
    pub fn with_id(id: NamespaceId) -> Self {
        Self {
            id,
            claimed: HashSet::new(),
        }
    }

    pub fn id(&self) -> NamespaceId {
        self.id
    }

    pub fn contains(&self, key: &SlotKey) -> bool {
        self.claimed.contains(key)
    }

    /// Number of claimed keys
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    /// Claimed keys, in no particular order
    pub fn keys(&self) -> impl Iterator<Item = &SlotKey> {
        self.claimed.iter()
    }

    /// Returns false if the key was already present
    pub(crate) fn insert(&mut self, key: SlotKey) -> bool {
        self.claimed.insert(key)
    }

    /// Returns false if the key was absent
    pub(crate) fn remove(&mut self, key: &SlotKey) -> bool {
        self.claimed.remove(key)
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}
