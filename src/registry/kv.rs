//! Generic key/value registry
//!
//! Any sender may insert a fresh key; only the sender who inserted it may
//! update or remove it.

use crate::config::Limits;
use crate::context::ExecutionContext;
use crate::error::{Error, Result};
use crate::payload::PayloadStore;
use crate::slot::{
    allocator, derive_address, AccountId, DerivedAddress, Namespace, NamespaceId, SlotKey,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub owner: AccountId,
    pub value: Vec<u8>,
    pub created_epoch: u64,
    pub updated_epoch: u64,
}

pub struct KeyValueRegistry {
    namespace: Namespace,
    entries: PayloadStore<Entry>,
    limits: Limits,
}

impl KeyValueRegistry {
    pub fn new(limits: Limits) -> Self {
        Self::with_namespace(NamespaceId::new(), limits)
    }

    pub fn with_namespace(id: NamespaceId, limits: Limits) -> Self {
        Self {
            namespace: Namespace::with_id(id),
            entries: PayloadStore::new(),
            limits,
        }
    }

    pub fn namespace_id(&self) -> NamespaceId {
        self.namespace.id()
    }

    pub fn address_of(&self, key: impl Into<SlotKey>) -> DerivedAddress {
        derive_address(&self.namespace.id(), &key.into())
    }

    fn check_size(&self, value: &[u8]) -> Result<()> {
        if value.len() > self.limits.max_payload_bytes {
            return Err(Error::LimitExceeded(format!(
                "Value of {} bytes exceeds {} bytes",
                value.len(),
                self.limits.max_payload_bytes
            )));
        }
        Ok(())
    }

    /// Entry at `key`, checked against the sender
    fn owned_entry(&mut self, ctx: &ExecutionContext, key: &SlotKey) -> Result<&mut Entry> {
        let address = derive_address(&self.namespace.id(), key);
        let entry = self
            .entries
            .get_mut(&address)
            .ok_or_else(|| Error::NotFound(format!("No entry for {}", key)))?;
        if entry.owner != ctx.sender {
            return Err(Error::Unauthorized(format!("{} does not own {}", ctx.sender, key)));
        }
        Ok(entry)
    }

    /// Insert a new key owned by the sender
    pub fn insert(
        &mut self,
        ctx: &ExecutionContext,
        key: impl Into<SlotKey>,
        value: Vec<u8>,
    ) -> Result<DerivedAddress> {
        self.check_size(&value)?;
        let capability = allocator::claim(&mut self.namespace, key)?;
        let address = self.entries.place(
            capability,
            Entry {
                owner: ctx.sender,
                value,
                created_epoch: ctx.epoch,
                updated_epoch: ctx.epoch,
            },
        )?;
        debug!(owner = %ctx.sender, address = %address, "Inserted entry");
        Ok(address)
    }

    pub fn get(&self, key: impl Into<SlotKey>) -> Option<&Entry> {
        self.entries.get(&self.address_of(key))
    }

    /// Replace the value of a key the sender owns
    pub fn update(
        &mut self,
        ctx: &ExecutionContext,
        key: impl Into<SlotKey>,
        value: Vec<u8>,
    ) -> Result<()> {
        self.check_size(&value)?;
        let key = key.into();
        let entry = self.owned_entry(ctx, &key)?;
        entry.value = value;
        entry.updated_epoch = ctx.epoch;
        debug!(owner = %ctx.sender, key = %key, "Updated entry");
        Ok(())
    }

    /// Remove a key the sender owns and free it for reuse
    pub fn remove(&mut self, ctx: &ExecutionContext, key: impl Into<SlotKey>) -> Result<Vec<u8>> {
        let key = key.into();
        self.owned_entry(ctx, &key)?;

        let address = derive_address(&self.namespace.id(), &key);
        let entry = self
            .entries
            .destroy(&address)
            .ok_or_else(|| Error::NotFound(format!("No entry for {}", key)))?;
        allocator::release_verified(&mut self.namespace, key, &self.entries)?;
        Ok(entry.value)
    }

    pub fn contains(&self, key: impl Into<SlotKey>) -> bool {
        allocator::exists(&self.namespace, key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(name: &str, epoch: u64) -> ExecutionContext {
        ExecutionContext::new(AccountId::from_public_key(name.as_bytes()), epoch)
    }

    #[test]
    fn test_insert_get_update() -> Result<()> {
        let mut registry = KeyValueRegistry::new(Limits::default());
        let alice = ctx("alice", 1);

        let address = registry.insert(&alice, "color", b"blue".to_vec())?;
        assert_eq!(address, registry.address_of("color"));
        assert!(registry.contains("color"));

        registry.update(&alice.at_epoch(4), "color", b"green".to_vec())?;
        let entry = registry.get("color").ok_or_else(|| Error::NotFound("color".into()))?;
        assert_eq!(entry.value, b"green");
        assert_eq!(entry.created_epoch, 1);
        assert_eq!(entry.updated_epoch, 4);
        Ok(())
    }

    #[test]
    fn test_duplicate_insert_refused() -> Result<()> {
        let mut registry = KeyValueRegistry::new(Limits::default());
        registry.insert(&ctx("alice", 1), 7u64, vec![1])?;
        assert!(matches!(
            registry.insert(&ctx("bob", 1), 7u8, vec![2]),
            Err(Error::AlreadyClaimed { .. })
        ));
        assert_eq!(registry.get(7u32).map(|e| e.value.clone()), Some(vec![1]));
        Ok(())
    }

    #[test]
    fn test_only_owner_mutates() -> Result<()> {
        let mut registry = KeyValueRegistry::new(Limits::default());
        let alice = ctx("alice", 1);
        let bob = ctx("bob", 1);

        registry.insert(&alice, "k", b"v".to_vec())?;
        assert!(matches!(registry.update(&bob, "k", vec![]), Err(Error::Unauthorized(_))));
        assert!(matches!(registry.remove(&bob, "k"), Err(Error::Unauthorized(_))));
        assert!(matches!(registry.update(&bob, "missing", vec![]), Err(Error::NotFound(_))));
        assert!(registry.contains("k"));
        Ok(())
    }

    #[test]
    fn test_payload_limit() {
        let limits = Limits {
            max_payload_bytes: 4,
            ..Limits::default()
        };
        let mut registry = KeyValueRegistry::new(limits);
        assert!(matches!(
            registry.insert(&ctx("alice", 1), "k", vec![0; 5]),
            Err(Error::LimitExceeded(_))
        ));
        assert!(!registry.contains("k"));
    }

    #[test]
    fn test_remove_and_reinsert() -> Result<()> {
        let mut registry = KeyValueRegistry::new(Limits::default());
        let alice = ctx("alice", 1);
        let bob = ctx("bob", 2);

        let first = registry.insert(&alice, "k", b"v1".to_vec())?;
        assert_eq!(registry.remove(&alice, "k")?, b"v1");
        assert!(!registry.contains("k"));
        assert!(registry.is_empty());

        let second = registry.insert(&bob, "k", b"v2".to_vec())?;
        assert_eq!(first, second);
        assert_eq!(registry.get("k").map(|e| e.owner), Some(bob.sender));
        Ok(())
    }
}
