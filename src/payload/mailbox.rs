//! Send-to-address mailbox
//!
//! Items can be sent to a derived address whether or not an object lives
//! there yet. Whoever later occupies the address collects them.

use crate::slot::DerivedAddress;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Mailbox<T> {
    inboxes: HashMap<DerivedAddress, Vec<T>>,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            inboxes: HashMap::new(),
        }
    }

    /// Queue `item` for `address`
    pub fn deliver(&mut self, address: DerivedAddress, item: T) {
        let inbox = self.inboxes.entry(address).or_default();
        inbox.push(item);
        debug!(address = %address, queued = inbox.len(), "Delivered item");
    }

    /// Items waiting at `address`, oldest first
    pub fn pending(&self, address: &DerivedAddress) -> &[T] {
        self.inboxes.get(address).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Drain everything waiting at `address`, oldest first
    pub fn collect(&mut self, address: &DerivedAddress) -> Vec<T> {
        self.inboxes.remove(address).unwrap_or_default()
    }

    /// Drop everything waiting at `address`, returning how many items went
    pub fn discard(&mut self, address: &DerivedAddress) -> usize {
        self.collect(address).len()
    }

    /// Number of addresses with something waiting
    pub fn len(&self) -> usize {
        self.inboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inboxes.is_empty()
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
