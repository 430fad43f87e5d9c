//! Multisig account descriptors
//!
//! A k-of-n account is an ordered list of member keys plus a threshold.
//! Member order matters: it fixes the address and the position of every
//! partial signature.

use crate::core::codec::{self, CodecError};
use crate::core::Address;
use crate::crypto::{domain_hash, KeyError, PubKey, MULTISIG_DOMAIN};
use crate::multisig::signature::{MultisigSig, MultisigSubsig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only multisig version currently defined
pub const MULTISIG_VERSION: u8 = 1;

/// Errors related to multisig operations
#[derive(Error, Debug)]
pub enum MultisigError {
    #[error("Unsupported multisig version: {0}")]
    InvalidVersion(u8),
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),
    #[error("Duplicate member public key")]
    DuplicateSigner,
    #[error("Signer not a member of the multisig account: {0}")]
    NotMember(Address),
    #[error("Authorization was produced for a different multisig account")]
    AccountMismatch,
    #[error("Signatures cover different transactions")]
    TransactionMismatch,
    #[error("Transaction sender {sender} is not the multisig address {account}")]
    SenderMismatch { sender: Address, account: Address },
    #[error("Expected a multisig authorization, found {0}")]
    NotMultisig(&'static str),
    #[error("Conflicting signatures for member {0}")]
    ConflictingSignatures(usize),
    #[error("Insufficient signatures: have {have}, need {need}")]
    InsufficientSignatures { have: usize, need: u8 },
    #[error("Invalid signature from member {0}")]
    InvalidSignature(usize),
    #[error("Nothing to merge")]
    EmptyMerge,
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("Crypto error: {0}")]
    Crypto(#[from] KeyError),
}

/// A k-of-n multisig account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigAccount {
    pub version: u8,
    /// Minimum signatures required (k)
    pub threshold: u8,
    /// Member keys in signing order (n)
    pub members: Vec<PubKey>,
}

impl MultisigAccount {
    /// Create and validate a multisig account
    ///
    /// # Errors
    /// Returns error if the version is unknown, `k` is outside `[1, n]` or a
    /// member key is repeated.
    pub fn new(version: u8, threshold: u8, members: Vec<PubKey>) -> Result<Self, MultisigError> {
        let account = Self {
            version,
            threshold,
            members,
        };
        account.validate()?;
        Ok(account)
    }

    /// Check the account invariants; decoded accounts are re-validated with this
    pub fn validate(&self) -> Result<(), MultisigError> {
        if self.version != MULTISIG_VERSION {
            return Err(MultisigError::InvalidVersion(self.version));
        }

        if self.threshold == 0 {
            return Err(MultisigError::InvalidThreshold(
                "threshold must be at least 1".to_string(),
            ));
        }

        if self.threshold as usize > self.members.len() {
            return Err(MultisigError::InvalidThreshold(format!(
                "threshold {} exceeds member count {}",
                self.threshold,
                self.members.len()
            )));
        }

        for (i, member) in self.members.iter().enumerate() {
            if self.members[..i].contains(member) {
                return Err(MultisigError::DuplicateSigner);
            }
        }

        Ok(())
    }

    /// Account address: `SHA-512/256("MultisigAddr" || version || k || pk_1 .. pk_n)`
    pub fn address(&self) -> Address {
        let mut data = vec![self.version, self.threshold];
        for member in &self.members {
            data.extend_from_slice(&member.to_bytes());
        }
        Address::new(domain_hash(MULTISIG_DOMAIN, &data))
    }

    /// Position of a key in the member list
    pub fn member_index(&self, key: &PubKey) -> Option<usize> {
        self.members.iter().position(|m| m == key)
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Get description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.members.len())
    }

    /// An authorization with every position still empty
    pub fn blank_sig(&self) -> MultisigSig {
        MultisigSig {
            version: self.version,
            threshold: self.threshold,
            subsigs: self
                .members
                .iter()
                .map(|key| MultisigSubsig {
                    key: *key,
                    sig: None,
                })
                .collect(),
        }
    }

    /// Whether an authorization was produced for exactly this account
    pub fn matches(&self, msig: &MultisigSig) -> bool {
        msig.version == self.version
            && msig.threshold == self.threshold
            && msig.subsigs.len() == self.members.len()
            && msig
                .subsigs
                .iter()
                .zip(&self.members)
                .all(|(sub, member)| sub.key == *member)
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        codec::encode(self)
    }

    /// Decode and re-validate an account read from disk
    pub fn decode(bytes: &[u8]) -> Result<Self, MultisigError> {
        let account: Self = codec::decode(bytes)?;
        account.validate()?;
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    fn members(n: usize) -> Vec<PubKey> {
        (0..n).map(|_| KeyPair::generate().public_key()).collect()
    }

    #[test]
    fn test_account_creation() {
        let account = MultisigAccount::new(1, 2, members(3)).unwrap();

        assert_eq!(account.threshold(), 2);
        assert_eq!(account.member_count(), 3);
        assert_eq!(account.description(), "2-of-3");
    }

    #[test]
    fn test_account_validation() {
        // Zero threshold
        assert!(matches!(
            MultisigAccount::new(1, 0, members(3)),
            Err(MultisigError::InvalidThreshold(_))
        ));

        // Threshold > members
        assert!(matches!(
            MultisigAccount::new(1, 4, members(3)),
            Err(MultisigError::InvalidThreshold(_))
        ));

        // No members at all
        assert!(MultisigAccount::new(1, 1, vec![]).is_err());

        // Unknown version
        assert!(matches!(
            MultisigAccount::new(2, 1, members(2)),
            Err(MultisigError::InvalidVersion(2))
        ));

        // Duplicate members
        let key = KeyPair::generate().public_key();
        assert!(matches!(
            MultisigAccount::new(1, 1, vec![key, key]),
            Err(MultisigError::DuplicateSigner)
        ));

        // 1-of-1 is allowed
        assert!(MultisigAccount::new(1, 1, members(1)).is_ok());
    }

    #[test]
    fn test_address_determinism() {
        let keys = members(3);

        let a = MultisigAccount::new(1, 2, keys.clone()).unwrap();
        let b = MultisigAccount::new(1, 2, keys.clone()).unwrap();
        assert_eq!(a.address(), b.address());

        // Threshold and member order are both part of the address
        let c = MultisigAccount::new(1, 1, keys.clone()).unwrap();
        assert_ne!(a.address(), c.address());

        let mut reversed = keys;
        reversed.reverse();
        let d = MultisigAccount::new(1, 2, reversed).unwrap();
        assert_ne!(a.address(), d.address());
    }

    #[test]
    fn test_member_index() {
        let keys = members(3);
        let account = MultisigAccount::new(1, 2, keys.clone()).unwrap();

        assert_eq!(account.member_index(&keys[2]), Some(2));
        assert_eq!(
            account.member_index(&KeyPair::generate().public_key()),
            None
        );
    }

    #[test]
    fn test_encoding_round_trip_revalidates() {
        let account = MultisigAccount::new(1, 2, members(3)).unwrap();
        let decoded = MultisigAccount::decode(&account.encode().unwrap()).unwrap();
        assert_eq!(decoded, account);

        let broken = MultisigAccount {
            version: 1,
            threshold: 5,
            members: members(2),
        };
        let bytes = codec::encode(&broken).unwrap();
        assert!(matches!(
            MultisigAccount::decode(&bytes),
            Err(MultisigError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_blank_sig_matches_account() {
        let account = MultisigAccount::new(1, 2, members(3)).unwrap();
        let blank = account.blank_sig();
        assert!(account.matches(&blank));
        assert_eq!(blank.signature_count(), 0);

        let other = MultisigAccount::new(1, 2, members(3)).unwrap();
        assert!(!other.matches(&blank));
    }
}
