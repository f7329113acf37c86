//! Keyed slot allocation
//!
//! Maps `(namespace, key)` pairs to deterministic child addresses and tracks
//! which keys are claimed.
//!
//! # Architecture
//!
//! ```text
//! NamespaceId ──┐
//!               ├─→ derive_address ─→ DerivedAddress   (pure, off-line)
//! SlotKey ──────┘
//!
//! Namespace { id, claimed: {k1, k2, ...} }
//!   ├─→ claim(k)    → Capability(address)   at most once per key
//!   └─→ release(k)  → key free again, same address on reclaim
//!
//! ClaimJournal (append-only log)
//!   └─→ Namespace rebuilt on open, last record wins
//! ```

pub mod address;
pub mod allocator;
pub mod journal;
pub mod key;
pub mod namespace;
pub mod shared;

pub use address::{derive_address, derive_addresses, DerivedAddress, NamespaceId, ADDRESS_LENGTH};
pub use allocator::{claim, exists, release, release_verified, Capability, SlotOccupancy};
pub use journal::{ClaimJournal, JournalOp, JournalRecord};
pub use key::{AccountId, KeyKind, SlotKey, ACCOUNT_ID_LENGTH};
pub use namespace::Namespace;
pub use shared::{NamespaceDirectory, SharedNamespace};
