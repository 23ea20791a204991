//! Account addresses.

use crate::crypto::CryptoError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length in bytes of an [`Address`].
pub const ADDRESS_LENGTH: usize = 20;

/// A 20-byte account identifier: the leading bytes of a public key's hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub [u8; ADDRESS_LENGTH]);

impl Address {
    pub const ZERO: Self = Self([0u8; ADDRESS_LENGTH]);

    /// Build an address from a slice of exactly [`ADDRESS_LENGTH`] bytes.
    ///
    /// # Panics
    ///
    /// Panics on any other length.
    pub fn from_slice(bytes: &[u8]) -> Self {
        assert_eq!(
            bytes.len(),
            ADDRESS_LENGTH,
            "given bytes with length {} should be {}",
            bytes.len(),
            ADDRESS_LENGTH
        );
        let mut arr = [0u8; ADDRESS_LENGTH];
        arr.copy_from_slice(bytes);
        Self(arr)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse user input, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
            .map_err(|_| CryptoError::InvalidAddress)?;
        <[u8; ADDRESS_LENGTH]>::try_from(bytes.as_slice())
            .map(Self)
            .map_err(|_| CryptoError::InvalidAddress)
    }
}

impl From<[u8; ADDRESS_LENGTH]> for Address {
    fn from(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
