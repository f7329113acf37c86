//! Canonical key encoding
//!
//! Keys reach the allocator in many surface forms: strings, raw bytes,
//! unsigned integers of any width and account identifiers. Before an address
//! is derived every key is reduced to one canonical byte string, so that two
//! semantically equal keys always land on the same slot.
//!
//! ```text
//! bytes / UTF-8 text  →  0x00 ‖ raw bytes
//! unsigned integer    →  0x01 ‖ u128 big-endian (16 bytes)
//! AccountId           →  0x02 ‖ 32 bytes
//! ```

use super::address::blake2b256;
use crate::error::{Error, Result};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const TAG_BYTES: u8 = 0x00;
const TAG_UINT: u8 = 0x01;
const TAG_ACCOUNT: u8 = 0x02;

const UINT_WIDTH: usize = 16;

/// The number of bytes in an account identifier
pub const ACCOUNT_ID_LENGTH: usize = 32;

/// Identity of a principal (the invoking sender, a vault owner, ...)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId([u8; ACCOUNT_ID_LENGTH]);

impl AccountId {
    /// Wrap raw account bytes
    pub const fn new(bytes: [u8; ACCOUNT_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Derive an account identifier from public key material.
    ///
    /// The preimage is `"account" ‖ 0x00 ‖ public_key`, hashed with BLAKE2b-256.
    pub fn from_public_key(public_key: &[u8]) -> Self {
        let mut preimage = Vec::with_capacity(8 + public_key.len());
        preimage.extend_from_slice(b"account");
        preimage.push(0);
        preimage.extend_from_slice(public_key);
        Self(blake2b256(&preimage))
    }

    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "account-{}", self.to_hex())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.to_hex())
    }
}

impl FromStr for AccountId {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let hex_part = input.strip_prefix("account-").unwrap_or(input);
        let bytes = hex::decode(hex_part)
            .map_err(|e| Error::InvalidArgument(format!("Invalid account hex: {}", e)))?;
        let bytes = <[u8; ACCOUNT_ID_LENGTH]>::try_from(bytes.as_slice()).map_err(|_| {
            Error::InvalidArgument(format!(
                "Account id must be {} bytes, got {}",
                ACCOUNT_ID_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            self.to_hex().serialize(serializer)
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            AccountId::from_str(&text).map_err(de::Error::custom)
        } else {
            let bytes = <[u8; ACCOUNT_ID_LENGTH]>::deserialize(deserializer)?;
            Ok(AccountId(bytes))
        }
    }
}

/// Which surface form a key was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Bytes,
    Uint,
    Account,
}

/// A key in canonical form.
///
/// Equality and hashing operate on the canonical bytes, so the claimed-key
/// set never needs to derive an address to answer a membership test.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey(Vec<u8>);

impl SlotKey {
    /// Key from an arbitrary byte string (UTF-8 text uses the same encoding)
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Self {
        let bytes = bytes.as_ref();
        let mut canonical = Vec::with_capacity(1 + bytes.len());
        canonical.push(TAG_BYTES);
        canonical.extend_from_slice(bytes);
        Self(canonical)
    }

    /// Key from an unsigned integer of any width
    pub fn from_uint(value: u128) -> Self {
        let mut canonical = Vec::with_capacity(1 + UINT_WIDTH);
        canonical.push(TAG_UINT);
        canonical.extend_from_slice(&value.to_be_bytes());
        Self(canonical)
    }

    pub fn from_account(account: &AccountId) -> Self {
        let mut canonical = Vec::with_capacity(1 + ACCOUNT_ID_LENGTH);
        canonical.push(TAG_ACCOUNT);
        canonical.extend_from_slice(account.as_bytes());
        Self(canonical)
    }

    /// Rebuild a key from its canonical bytes, validating tag and width
    pub fn from_canonical(canonical: Vec<u8>) -> Result<Self> {
        match canonical.first() {
            Some(&TAG_BYTES) => Ok(Self(canonical)),
            Some(&TAG_UINT) if canonical.len() == 1 + UINT_WIDTH => Ok(Self(canonical)),
            Some(&TAG_ACCOUNT) if canonical.len() == 1 + ACCOUNT_ID_LENGTH => Ok(Self(canonical)),
            Some(tag) => Err(Error::InvalidArgument(format!(
                "Malformed canonical key (tag {:#04x}, {} bytes)",
                tag,
                canonical.len()
            ))),
            None => Err(Error::InvalidArgument("Empty canonical key".to_string())),
        }
    }

    /// Canonical bytes fed into address derivation
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn kind(&self) -> KeyKind {
        match self.0[0] {
            TAG_UINT => KeyKind::Uint,
            TAG_ACCOUNT => KeyKind::Account,
            _ => KeyKind::Bytes,
        }
    }

    /// The key body without its tag byte
    pub fn payload(&self) -> &[u8] {
        &self.0[1..]
    }

    pub fn as_uint(&self) -> Option<u128> {
        match self.kind() {
            KeyKind::Uint => {
                let bytes = <[u8; UINT_WIDTH]>::try_from(self.payload()).ok()?;
                Some(u128::from_be_bytes(bytes))
            }
            _ => None,
        }
    }

    pub fn as_account(&self) -> Option<AccountId> {
        match self.kind() {
            KeyKind::Account => {
                let bytes = <[u8; ACCOUNT_ID_LENGTH]>::try_from(self.payload()).ok()?;
                Some(AccountId::new(bytes))
            }
            _ => None,
        }
    }
}

impl fmt::Display for SlotKey {
    /// `str:<text>` for printable UTF-8, `hex:<bytes>` otherwise, `u:<n>` and
    /// `account:<hex>` for the other kinds. Parsed back by `FromStr`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            KeyKind::Uint => match self.as_uint() {
                Some(value) => write!(f, "u:{}", value),
                None => write!(f, "hex:{}", hex::encode(self.payload())),
            },
            KeyKind::Account => write!(f, "account:{}", hex::encode(self.payload())),
            KeyKind::Bytes => match std::str::from_utf8(self.payload()) {
                Ok(text) if !text.chars().any(char::is_control) => write!(f, "str:{}", text),
                _ => write!(f, "hex:{}", hex::encode(self.payload())),
            },
        }
    }
}

impl fmt::Debug for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotKey({})", self)
    }
}

impl FromStr for SlotKey {
    type Err = Error;

    /// Accepts `u:<decimal>`, `hex:<bytes>`, `account:<hex>`, `str:<text>`,
    /// or bare text.
    fn from_str(input: &str) -> Result<Self> {
        if let Some(number) = input.strip_prefix("u:") {
            let value = number
                .parse::<u128>()
                .map_err(|e| Error::InvalidArgument(format!("Invalid integer key: {}", e)))?;
            Ok(Self::from_uint(value))
        } else if let Some(encoded) = input.strip_prefix("hex:") {
            let bytes = hex::decode(encoded)
                .map_err(|e| Error::InvalidArgument(format!("Invalid hex key: {}", e)))?;
            Ok(Self::from_bytes(bytes))
        } else if let Some(account) = input.strip_prefix("account:") {
            Ok(Self::from_account(&AccountId::from_str(account)?))
        } else if let Some(text) = input.strip_prefix("str:") {
            Ok(Self::from_bytes(text))
        } else {
            Ok(Self::from_bytes(input))
        }
    }
}

impl Serialize for SlotKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(&self.0))
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for SlotKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let canonical = if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            hex::decode(text).map_err(de::Error::custom)?
        } else {
            Vec::<u8>::deserialize(deserializer)?
        };
        SlotKey::from_canonical(canonical).map_err(de::Error::custom)
    }
}

impl From<&str> for SlotKey {
    fn from(text: &str) -> Self {
        Self::from_bytes(text)
    }
}

impl From<String> for SlotKey {
    fn from(text: String) -> Self {
        Self::from_bytes(text)
    }
}

impl From<&String> for SlotKey {
    fn from(text: &String) -> Self {
        Self::from_bytes(text)
    }
}

impl From<&[u8]> for SlotKey {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl<const N: usize> From<&[u8; N]> for SlotKey {
    fn from(bytes: &[u8; N]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Vec<u8>> for SlotKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<AccountId> for SlotKey {
    fn from(account: AccountId) -> Self {
        Self::from_account(&account)
    }
}

impl From<&AccountId> for SlotKey {
    fn from(account: &AccountId) -> Self {
        Self::from_account(account)
    }
}

impl From<&SlotKey> for SlotKey {
    fn from(key: &SlotKey) -> Self {
        key.clone()
    }
}

macro_rules! impl_from_uint {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for SlotKey {
                fn from(value: $ty) -> Self {
                    Self::from_uint(value as u128)
                }
            }
        )*
    };
}

impl_from_uint!(u8, u16, u32, u64, u128, usize);
