// keyslot - Deterministic keyed-slot allocation
// Derive child addresses from a namespace and a key, claim each at most once

#![warn(rust_2018_idioms)]

pub mod config;
pub mod context;
pub mod metrics;
pub mod payload;
pub mod registry;
pub mod slot;

// Re-exports for convenience
pub use config::Settings;
pub use context::ExecutionContext;
pub use payload::{Mailbox, PayloadStore};
pub use slot::{
    derive_address, AccountId, Capability, ClaimJournal, DerivedAddress, Namespace, NamespaceId,
    SlotKey,
};

/// keyslot error types
pub mod error {
    use crate::slot::{DerivedAddress, NamespaceId, SlotKey};
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Key {key} already claimed in namespace {namespace}")]
        AlreadyClaimed { namespace: NamespaceId, key: SlotKey },

        #[error("Key {key} is not claimed in namespace {namespace}")]
        NotClaimed { namespace: NamespaceId, key: SlotKey },

        #[error("Slot occupied: {0}")]
        SlotOccupied(DerivedAddress),

        #[error("Not found: {0}")]
        NotFound(String),

        #[error("Unauthorized: {0}")]
        Unauthorized(String),

        #[error("Insufficient funds: requested {requested}, available {available}")]
        InsufficientFunds { requested: u64, available: u64 },

        #[error("Limit exceeded: {0}")]
        LimitExceeded(String),

        #[error("Invalid argument: {0}")]
        InvalidArgument(String),

        #[error("Storage error: {0}")]
        Storage(String),

        #[error("Serialization error: {0}")]
        SerializationError(String),

        #[error("Configuration error: {0}")]
        Config(String),
    }

    pub type Result<T> = std::result::Result<T, Error>;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
