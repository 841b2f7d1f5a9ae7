//! Ledger account identifiers.
//!
//! Accounts are 32-byte Ed25519 public keys rendered in base58 (Bitcoin
//! alphabet). An identifier is only accepted if it decodes to exactly 32
//! bytes that form a valid compressed Edwards point; program-derived
//! addresses, which are deliberately off-curve, are rejected.

use std::fmt;
use std::str::FromStr;

use curve25519_dalek::edwards::CompressedEdwardsY;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AccountIdError;

/// Length in bytes of a decoded account key.
pub const ACCOUNT_KEY_LEN: usize = 32;

/// A validated ledger account identifier.
///
/// Keeps both the canonical base58 text and the decoded key bytes so that
/// callers can use whichever form a query needs without re-decoding.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AccountId {
    text: String,
    bytes: [u8; ACCOUNT_KEY_LEN],
}

impl AccountId {
    /// Parse and validate a base58 account identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use bytescore_core::account::AccountId;
    ///
    /// let id = AccountId::parse("6x5SYnLroiN7WYq8NQYU9KHcH4YjpBbwpUfVu3EB7ieH").unwrap();
    /// assert_eq!(id.as_str(), "6x5SYnLroiN7WYq8NQYU9KHcH4YjpBbwpUfVu3EB7ieH");
    /// assert!(AccountId::parse("not-an-address").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, AccountIdError> {
        if s.is_empty() {
            return Err(AccountIdError::Empty);
        }

        let decoded = bs58::decode(s)
            .into_vec()
            .map_err(|e| AccountIdError::InvalidBase58(e.to_string()))?;

        let bytes: [u8; ACCOUNT_KEY_LEN] = decoded
            .as_slice()
            .try_into()
            .map_err(|_| AccountIdError::InvalidLength(decoded.len()))?;

        if CompressedEdwardsY(bytes).decompress().is_none() {
            return Err(AccountIdError::OffCurve);
        }

        // Re-encode so leading-zero handling is canonical.
        Ok(Self {
            text: bs58::encode(bytes).into_string(),
            bytes,
        })
    }

    /// Returns `true` if `s` is a syntactically valid, on-curve account id.
    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    /// Base58 text form.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Raw 32-byte key.
    pub fn as_bytes(&self) -> &[u8; ACCOUNT_KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for AccountId {
    type Err = AccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
