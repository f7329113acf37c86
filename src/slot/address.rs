//! Namespace identifiers and derived addresses
//!
//! ```text
//! address = BLAKE2b-256( "keyslot/v1" ‖ 0x00 ‖ namespace_id[16] ‖ canonical key )
//! ```
//!
//! Derivation is a pure function of `(namespace_id, key)`. It touches no
//! allocator state, so anyone who knows a namespace id can compute slot
//! addresses off-line, even before the namespace itself exists.

use super::key::SlotKey;
use crate::error::{Error, Result};
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use rayon::prelude::*;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The number of bytes in a derived address
pub const ADDRESS_LENGTH: usize = 32;

/// Domain separator mixed into every derivation
const DERIVATION_DOMAIN: &[u8] = b"keyslot/v1";

/// Textual prefix for formatted addresses
const ADDRESS_PREFIX: &str = "slot-";

/// Batches larger than this are derived on the rayon pool
const PARALLEL_THRESHOLD: usize = 100;

type Blake2b256 = Blake2b<U32>;

/// BLAKE2b with a 32-byte digest
pub(crate) fn blake2b256(data: &[u8]) -> [u8; ADDRESS_LENGTH] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let mut digest = [0u8; ADDRESS_LENGTH];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// Stable identifier of a namespace (the parent scope of a set of keys).
///
/// Wraps a 128-bit UUID, like the database and table identifiers of the
/// storage layer it grew out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NamespaceId(Uuid);

impl NamespaceId {
    /// Creates a new random namespace ID using UUIDv4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The all-zero namespace
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Namespace nested under a derived address.
    ///
    /// Takes the first 16 bytes of the parent slot's address, so a child
    /// scope is as computable off-line as the slot that owns it.
    pub fn from_address(address: &DerivedAddress) -> Self {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&address.as_bytes()[..16]);
        Self(Uuid::from_bytes(bytes))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for NamespaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NamespaceId {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| Error::InvalidArgument(format!("Invalid namespace id '{}': {}", input, e)))
    }
}

/// Fixed-width address of a child slot
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DerivedAddress([u8; ADDRESS_LENGTH]);

impl DerivedAddress {
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// `slot-<64 lowercase hex>`
    pub fn to_formatted_string(&self) -> String {
        format!("{}{}", ADDRESS_PREFIX, self.to_hex())
    }

    /// Parses `slot-<hex>` (the prefix is optional)
    pub fn from_formatted_str(input: &str) -> Result<Self> {
        let remainder = input.strip_prefix(ADDRESS_PREFIX).unwrap_or(input);
        let bytes = hex::decode(remainder)
            .map_err(|e| Error::InvalidArgument(format!("Invalid address hex: {}", e)))?;
        let bytes = <[u8; ADDRESS_LENGTH]>::try_from(bytes.as_slice()).map_err(|_| {
            Error::InvalidArgument(format!(
                "Address must be {} bytes, got {}",
                ADDRESS_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for DerivedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_formatted_string())
    }
}

impl fmt::Debug for DerivedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedAddress({})", self.to_hex())
    }
}

impl FromStr for DerivedAddress {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        Self::from_formatted_str(input)
    }
}

impl Serialize for DerivedAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            self.to_formatted_string().serialize(serializer)
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for DerivedAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            DerivedAddress::from_formatted_str(&text).map_err(de::Error::custom)
        } else {
            let bytes = <[u8; ADDRESS_LENGTH]>::deserialize(deserializer)?;
            Ok(DerivedAddress(bytes))
        }
    }
}

/// Compute the address of `key` under `namespace_id`.
///
/// Total and side-effect free; identical inputs give identical output in
/// every process.
pub fn derive_address(namespace_id: &NamespaceId, key: &SlotKey) -> DerivedAddress {
    let key_bytes = key.as_bytes();
    let mut preimage = Vec::with_capacity(DERIVATION_DOMAIN.len() + 1 + 16 + key_bytes.len());
    preimage.extend_from_slice(DERIVATION_DOMAIN);
    preimage.push(0);
    preimage.extend_from_slice(namespace_id.as_bytes());
    preimage.extend_from_slice(key_bytes);
    DerivedAddress(blake2b256(&preimage))
}

/// Derive addresses for many keys, in input order.
///
/// Large batches are spread over the rayon pool.
pub fn derive_addresses(namespace_id: &NamespaceId, keys: &[SlotKey]) -> Vec<DerivedAddress> {
    if keys.len() > PARALLEL_THRESHOLD {
        keys.par_iter()
            .map(|key| derive_address(namespace_id, key))
            .collect()
    } else {
        keys.iter().map(|key| derive_address(namespace_id, key)).collect()
    }
}
