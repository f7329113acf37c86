//! Payload placement
//!
//! The allocator only reserves slots. Objects live here, at the derived
//! address of the key that was claimed for them.
//!
//! ```text
//! claim(ns, key) ─→ Capability ─→ PayloadStore::place(cap, payload)
//!                                        └─→ slots[address] = payload
//! Mailbox::deliver(address, item)   works before anything lives at address
//! ```

pub mod mailbox;

pub use mailbox::Mailbox;

use crate::error::{Error, Result};
use crate::metrics;
use crate::slot::{Capability, DerivedAddress, SlotOccupancy};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Objects keyed by derived address, at most one per address
#[derive(Debug, Clone)]
pub struct PayloadStore<P> {
    slots: HashMap<DerivedAddress, P>,
}

impl<P> PayloadStore<P> {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Place `payload` at the capability's address, consuming the capability.
    ///
    /// Fails with [`Error::SlotOccupied`] if something already lives there;
    /// the capability is spent either way.
    pub fn place(&mut self, capability: Capability, payload: P) -> Result<DerivedAddress> {
        let address = capability.redeem();

        if self.slots.contains_key(&address) {
            metrics::record_placement(false);
            warn!(address = %address, "Placement refused: slot occupied");
            return Err(Error::SlotOccupied(address));
        }

        self.slots.insert(address, payload);
        metrics::record_placement(true);
        debug!(address = %address, "Placed payload");
        Ok(address)
    }

    pub fn get(&self, address: &DerivedAddress) -> Option<&P> {
        self.slots.get(address)
    }

    pub fn get_mut(&mut self, address: &DerivedAddress) -> Option<&mut P> {
        self.slots.get_mut(address)
    }

    pub fn contains(&self, address: &DerivedAddress) -> bool {
        self.slots.contains_key(address)
    }

    /// Remove and return the payload at `address`
    pub fn destroy(&mut self, address: &DerivedAddress) -> Option<P> {
        let payload = self.slots.remove(address);
        if payload.is_some() {
            debug!(address = %address, "Destroyed payload");
        }
        payload
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DerivedAddress, &P)> {
        self.slots.iter()
    }
}

impl<P> Default for PayloadStore<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> SlotOccupancy for PayloadStore<P> {
    fn is_occupied(&self, address: &DerivedAddress) -> bool {
        self.contains(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::{allocator, Namespace};

    #[test]
    fn test_place_and_destroy() -> Result<()> {
        let mut ns = Namespace::new();
        let mut store = PayloadStore::new();

        let cap = allocator::claim(&mut ns, "alice")?;
        let expected = cap.address();
        let address = store.place(cap, 100u64)?;

        assert_eq!(address, expected);
        assert_eq!(store.get(&address), Some(&100));
        assert!(store.is_occupied(&address));

        if let Some(value) = store.get_mut(&address) {
            *value += 1;
        }
        assert_eq!(store.destroy(&address), Some(101));
        assert!(store.is_empty());
        assert_eq!(store.destroy(&address), None);
        Ok(())
    }

    #[test]
    fn test_second_placement_refused() -> Result<()> {
        let mut ns = Namespace::new();
        let mut store = PayloadStore::new();

        let cap = allocator::claim(&mut ns, "alice")?;
        store.place(cap, "first")?;

        // Released without destroying the payload: the reclaim must not
        // overwrite the object still sitting at the address.
        allocator::release(&mut ns, "alice")?;
        let cap = allocator::claim(&mut ns, "alice")?;
        assert!(matches!(store.place(cap, "second"), Err(Error::SlotOccupied(_))));
        assert_eq!(store.len(), 1);
        Ok(())
    }

    #[test]
    fn test_verified_release_against_store() -> Result<()> {
        let mut ns = Namespace::new();
        let mut store = PayloadStore::new();

        let address = store.place(allocator::claim(&mut ns, 1u8)?, ())?;
        assert!(allocator::release_verified(&mut ns, 1u8, &store).is_err());

        store.destroy(&address);
        allocator::release_verified(&mut ns, 1u8, &store)?;
        assert!(!allocator::exists(&ns, 1u8));
        Ok(())
    }
}
