//! Registries built on the slot allocator
//!
//! Each one owns its namespace(s) and payload store, passed explicitly to
//! every operation; none of them is a global.
//!
//! ```text
//! VaultLedger       owner      → Vault           (+ deposits in transit)
//! AccountRegistry   owner      → Account
//!                   username   → UsernameRecord  (+ message inboxes)
//! KeyValueRegistry  any key    → Entry
//! Parent            child key  → Child
//! ```

pub mod account;
pub mod kv;
pub mod parent;
pub mod vault;

pub use account::{Account, AccountRegistry, Message, UsernameRecord};
pub use kv::{Entry, KeyValueRegistry};
pub use parent::{Child, Parent};
pub use vault::{Deposit, Vault, VaultLedger};
