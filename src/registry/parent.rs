//! Minimal parent/child pair
//!
//! A parent owns a namespace; each child sits at the address derived from
//! the parent id and the child's key.

use crate::error::{Error, Result};
use crate::payload::PayloadStore;
use crate::slot::{allocator, derive_address, DerivedAddress, Namespace, NamespaceId, SlotKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
    pub parent: NamespaceId,
    pub key: SlotKey,
    pub value: String,
}

#[derive(Debug, Default)]
pub struct Parent {
    namespace: Namespace,
    children: PayloadStore<Child>,
}

impl Parent {
    pub fn new() -> Self {
        Self::with_id(NamespaceId::new())
    }

    pub fn with_id(id: NamespaceId) -> Self {
        Self {
            namespace: Namespace::with_id(id),
            children: PayloadStore::new(),
        }
    }

    pub fn id(&self) -> NamespaceId {
        self.namespace.id()
    }

    /// Computable without a `Parent` in hand
    pub fn child_address(parent_id: &NamespaceId, key: impl Into<SlotKey>) -> DerivedAddress {
        derive_address(parent_id, &key.into())
    }

    pub fn add_child(
        &mut self,
        key: impl Into<SlotKey>,
        value: impl Into<String>,
    ) -> Result<DerivedAddress> {
        let key = key.into();
        let capability = allocator::claim(&mut self.namespace, key.clone())?;
        self.children.place(
            capability,
            Child {
                parent: self.namespace.id(),
                key,
                value: value.into(),
            },
        )
    }

    pub fn child(&self, key: impl Into<SlotKey>) -> Option<&Child> {
        self.children.get(&Self::child_address(&self.id(), key))
    }

    pub fn set_child_value(
        &mut self,
        key: impl Into<SlotKey>,
        value: impl Into<String>,
    ) -> Result<()> {
        let key = key.into();
        let address = Self::child_address(&self.id(), &key);
        let child = self
            .children
            .get_mut(&address)
            .ok_or_else(|| Error::NotFound(format!("No child {}", key)))?;
        child.value = value.into();
        Ok(())
    }

    pub fn remove_child(&mut self, key: impl Into<SlotKey>) -> Result<Child> {
        let key = key.into();
        let address = Self::child_address(&self.id(), &key);
        let child = self
            .children
            .destroy(&address)
            .ok_or_else(|| Error::NotFound(format!("No child {}", key)))?;
        allocator::release_verified(&mut self.namespace, key, &self.children)?;
        Ok(child)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}
