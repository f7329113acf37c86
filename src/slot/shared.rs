//! Shared namespace handles
//!
//! `SharedNamespace` serializes writers on one namespace behind a mutex.
//! `NamespaceDirectory` keeps many of them in a sharded map, so work on
//! different namespaces never contends on a common lock.

use super::address::{derive_address, DerivedAddress, NamespaceId};
use super::allocator::{self, Capability, SlotOccupancy};
use super::key::SlotKey;
use super::namespace::Namespace;
use crate::error::Result;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// A namespace that many callers can reach, one writer at a time
#[derive(Debug, Clone)]
pub struct SharedNamespace {
    id: NamespaceId,
    inner: Arc<Mutex<Namespace>>,
}

impl SharedNamespace {
    pub fn new(namespace: Namespace) -> Self {
        Self {
            id: namespace.id(),
            inner: Arc::new(Mutex::new(namespace)),
        }
    }

    /// Namespace id, readable without taking the lock
    pub fn id(&self) -> NamespaceId {
        self.id
    }

    /// Address derivation needs no lock
    pub fn derive_address(&self, key: impl Into<SlotKey>) -> DerivedAddress {
        derive_address(&self.id, &key.into())
    }

    /// Run `op` with exclusive access to the namespace
    pub fn with<R>(&self, op: impl FnOnce(&mut Namespace) -> R) -> R {
        let mut guard = self.inner.lock();
        op(&mut guard)
    }

    pub fn exists(&self, key: impl Into<SlotKey>) -> bool {
        allocator::exists(&self.inner.lock(), key)
    }

    pub fn claim(&self, key: impl Into<SlotKey>) -> Result<Capability> {
        self.with(|ns| allocator::claim(ns, key))
    }

    pub fn release(&self, key: impl Into<SlotKey>) -> Result<()> {
        self.with(|ns| allocator::release(ns, key))
    }

    pub fn release_verified<O>(&self, key: impl Into<SlotKey>, occupancy: &O) -> Result<()>
    where
        O: SlotOccupancy + ?Sized,
    {
        self.with(|ns| allocator::release_verified(ns, key, occupancy))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Concurrent map of independent namespaces
#[derive(Debug, Default)]
pub struct NamespaceDirectory {
    namespaces: DashMap<NamespaceId, SharedNamespace>,
}

impl NamespaceDirectory {
    pub fn new() -> Self {
        Self {
            namespaces: DashMap::new(),
        }
    }

    /// Create a fresh namespace and return its handle
    pub fn create(&self) -> SharedNamespace {
        let handle = SharedNamespace::new(Namespace::new());
        self.namespaces.insert(handle.id(), handle.clone());
        debug!(namespace = %handle.id(), "Created namespace");
        handle
    }

    pub fn get(&self, id: &NamespaceId) -> Option<SharedNamespace> {
        self.namespaces.get(id).map(|entry| entry.value().clone())
    }

    /// Handle for `id`, creating an empty namespace on first use
    pub fn get_or_create(&self, id: NamespaceId) -> SharedNamespace {
        self.namespaces
            .entry(id)
            .or_insert_with(|| SharedNamespace::new(Namespace::with_id(id)))
            .value()
            .clone()
    }

    /// Drop a namespace from the directory, returning its handle
    pub fn remove(&self, id: &NamespaceId) -> Option<SharedNamespace> {
        self.namespaces.remove(id).map(|(_, handle)| handle)
    }

    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_concurrent_claims_single_winner() {
        let shared = SharedNamespace::new(Namespace::new());
        let winners = Arc::new(AtomicUsize::new(0));
        let refused = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let shared = shared.clone();
                let winners = winners.clone();
                let refused = refused.clone();
                thread::spawn(move || match shared.claim("contested") {
                    Ok(cap) => {
                        let _ = cap.redeem();
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(Error::AlreadyClaimed { .. }) => {
                        refused.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(e) => panic!("unexpected error: {}", e),
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("claim thread panicked");
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert_eq!(refused.load(Ordering::SeqCst), 15);
        assert_eq!(shared.len(), 1);
    }

    #[test]
    fn test_shared_lifecycle() -> Result<()> {
        let shared = SharedNamespace::new(Namespace::new());
        let address = shared.claim("alice")?.redeem();

        assert!(shared.exists("alice"));
        assert_eq!(shared.derive_address("alice"), address);
        shared.release("alice")?;
        assert!(shared.is_empty());

        let count = shared.with(|ns| {
            let _ = allocator::claim(ns, "bob").map(Capability::redeem);
            ns.len()
        });
        assert_eq!(count, 1);
        Ok(())
    }

    #[test]
    fn test_directory_isolation() -> Result<()> {
        let directory = NamespaceDirectory::new();
        let ns1 = directory.create();
        let ns2 = directory.create();

        let _ = ns1.claim("k")?;
        assert!(ns1.exists("k"));
        assert!(!ns2.exists("k"));
        assert_ne!(ns1.derive_address("k"), ns2.derive_address("k"));

        let again = directory.get_or_create(ns1.id());
        assert!(again.exists("k"));
        assert_eq!(directory.len(), 2);

        assert!(directory.remove(&ns1.id()).is_some());
        assert!(directory.get(&ns1.id()).is_none());
        assert_eq!(directory.len(), 1);
        Ok(())
    }
}
