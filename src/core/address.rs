//! Ledger addresses
//!
//! An address is a 32-byte digest. Key accounts hash the compressed public
//! key, multisig accounts hash their member list and escrow accounts hash
//! their program. The text form is `Base58(digest || checksum)` where the
//! checksum is the first 4 bytes of double SHA-256 over the digest.

use crate::crypto::{domain_hash, double_sha256, PubKey};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of the raw address digest
pub const ADDRESS_LEN: usize = 32;
const CHECKSUM_LEN: usize = 4;
const KEY_DOMAIN: &[u8] = b"PK";

/// Address parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid base58 encoding: {0}")]
    InvalidEncoding(String),
    #[error("Invalid address length: {0} bytes")]
    InvalidLength(usize),
    #[error("Address checksum mismatch")]
    ChecksumMismatch,
}

/// A 32-byte account address
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Address of a single-key account
    pub fn from_public_key(public_key: &PubKey) -> Self {
        Self(domain_hash(KEY_DOMAIN, &public_key.to_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// The all-zero address, used when a field is unset
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }

    fn checksum(bytes: &[u8]) -> [u8; CHECKSUM_LEN] {
        let hash = double_sha256(bytes);
        let mut out = [0u8; CHECKSUM_LEN];
        out.copy_from_slice(&hash[..CHECKSUM_LEN]);
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bytes = self.0.to_vec();
        bytes.extend_from_slice(&Self::checksum(&self.0));
        f.write_str(&bs58::encode(bytes).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s.trim())
            .into_vec()
            .map_err(|e| AddressError::InvalidEncoding(e.to_string()))?;

        if bytes.len() != ADDRESS_LEN + CHECKSUM_LEN {
            return Err(AddressError::InvalidLength(bytes.len()));
        }

        let (digest, checksum) = bytes.split_at(ADDRESS_LEN);
        if Self::checksum(digest) != checksum {
            return Err(AddressError::ChecksumMismatch);
        }

        let mut out = [0u8; ADDRESS_LEN];
        out.copy_from_slice(digest);
        Ok(Self(out))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(de::Error::custom)
        } else {
            <[u8; ADDRESS_LEN]>::deserialize(deserializer).map(Self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn test_string_round_trip() {
        let address = KeyPair::generate().address();
        let text = address.to_string();
        assert_eq!(text.parse::<Address>().unwrap(), address);
    }

    #[test]
    fn test_checksum_detects_typos() {
        let address = Address::new([7u8; ADDRESS_LEN]);
        let mut bytes = bs58::decode(address.to_string()).into_vec().unwrap();
        bytes[0] ^= 0x01;
        let corrupted = bs58::encode(bytes).into_string();
        assert_eq!(
            corrupted.parse::<Address>(),
            Err(AddressError::ChecksumMismatch)
        );
    }

    #[test]
    fn test_rejects_wrong_length() {
        let short = bs58::encode([1u8; 10]).into_string();
        assert_eq!(short.parse::<Address>(), Err(AddressError::InvalidLength(10)));
        assert!(matches!(
            "0OIl".parse::<Address>(),
            Err(AddressError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_address_is_deterministic_per_key() {
        let kp = KeyPair::generate();
        assert_eq!(Address::from_public_key(&kp.public_key()), kp.address());
        assert_ne!(kp.address(), KeyPair::generate().address());
        assert!(Address::default().is_zero());
    }

    #[test]
    fn test_serde_json_uses_text_form() {
        let address = Address::new([3u8; ADDRESS_LEN]);
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", address));
        assert_eq!(serde_json::from_str::<Address>(&json).unwrap(), address);
    }
}
