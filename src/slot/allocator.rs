//! Keyed slot allocator
//!
//! The four operations every caller builds on:
//!
//! ```text
//! derive_address(id, key)   pure, no state, no lock
//! exists(ns, key)           membership test
//! claim(&mut ns, key)       Unclaimed → Claimed, returns a Capability
//! release(&mut ns, key)     Claimed → Unclaimed
//! ```
//!
//! A key may cycle through claim and release indefinitely; every cycle maps
//! to the same address.

use super::address::{derive_address, DerivedAddress, NamespaceId};
use super::key::SlotKey;
use super::namespace::Namespace;
use crate::error::{Error, Result};
use crate::metrics;
use tracing::{debug, warn};

/// Proof that a claim succeeded.
///
/// Authorizes placing exactly one payload at [`Capability::address`]. Not
/// `Clone`; placing the payload consumes it.
#[derive(Debug)]
#[must_use = "a capability authorizes one placement and should be consumed"]
pub struct Capability {
    namespace_id: NamespaceId,
    key: SlotKey,
    address: DerivedAddress,
}

impl Capability {
    pub fn namespace_id(&self) -> NamespaceId {
        self.namespace_id
    }

    pub fn key(&self) -> &SlotKey {
        &self.key
    }

    pub fn address(&self) -> DerivedAddress {
        self.address
    }

    /// Consume the capability for a placement done outside this crate
    pub fn redeem(self) -> DerivedAddress {
        self.address
    }
}

/// Tells whether a payload currently lives at an address
pub trait SlotOccupancy {
    fn is_occupied(&self, address: &DerivedAddress) -> bool;
}

/// Membership test against the namespace's claimed set
pub fn exists(namespace: &Namespace, key: impl Into<SlotKey>) -> bool {
    namespace.contains(&key.into())
}

/// Claim `key` exactly once.
///
/// Fails with [`Error::AlreadyClaimed`] if the key is present, leaving the
/// namespace untouched.
pub fn claim(namespace: &mut Namespace, key: impl Into<SlotKey>) -> Result<Capability> {
    let key = key.into();

    if namespace.contains(&key) {
        metrics::record_claim(false);
        warn!(namespace = %namespace.id(), key = %key, "Claim refused: key already claimed");
        return Err(Error::AlreadyClaimed {
            namespace: namespace.id(),
            key,
        });
    }

    let address = derive_address(&namespace.id(), &key);
    namespace.insert(key.clone());
    metrics::record_claim(true);
    debug!(namespace = %namespace.id(), key = %key, address = %address, "Claimed slot");

    Ok(Capability {
        namespace_id: namespace.id(),
        key,
        address,
    })
}

/// Release a claimed key so it can be claimed again.
///
/// The payload placed at the key's address must already be gone; this
/// function cannot see it. Use [`release_verified`] when it can be checked.
pub fn release(namespace: &mut Namespace, key: impl Into<SlotKey>) -> Result<()> {
    let key = key.into();

    if !namespace.remove(&key) {
        metrics::record_release(false);
        warn!(namespace = %namespace.id(), key = %key, "Release refused: key not claimed");
        return Err(Error::NotClaimed {
            namespace: namespace.id(),
            key,
        });
    }

    metrics::record_release(true);
    debug!(namespace = %namespace.id(), key = %key, "Released slot");
    Ok(())
}

/// Release only once `occupancy` reports the key's address empty.
///
/// Fails with [`Error::SlotOccupied`] while a payload still lives there, so
/// a reclaim can never land on top of an object that was not destroyed.
pub fn release_verified<O>(
    namespace: &mut Namespace,
    key: impl Into<SlotKey>,
    occupancy: &O,
) -> Result<()>
where
    O: SlotOccupancy + ?Sized,
{
    let key = key.into();

    if !namespace.contains(&key) {
        metrics::record_release(false);
        return Err(Error::NotClaimed {
            namespace: namespace.id(),
            key,
        });
    }

    let address = derive_address(&namespace.id(), &key);
    if occupancy.is_occupied(&address) {
        metrics::record_release(false);
        warn!(
            namespace = %namespace.id(),
            key = %key,
            address = %address,
            "Release refused: payload still present"
        );
        return Err(Error::SlotOccupied(address));
    }

    release(namespace, key)
}
