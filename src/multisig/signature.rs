//! Accumulated multisig authorizations
//!
//! One slot per member, in account order. Filling a slot is append-only and
//! idempotent: signing again with a key whose slot is already filled leaves
//! the signature count unchanged.

use crate::crypto::{KeyPair, PubKey, Signature};
use crate::multisig::account::{MultisigAccount, MultisigError};
use serde::{Deserialize, Serialize};

/// One member's slot in a multisig authorization
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigSubsig {
    pub key: PubKey,
    pub sig: Option<Signature>,
}

/// A (possibly partial) k-of-n authorization
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigSig {
    pub version: u8,
    pub threshold: u8,
    pub subsigs: Vec<MultisigSubsig>,
}

impl MultisigSig {
    /// Return a copy with `key`'s slot filled with its signature over `message`
    ///
    /// `self` is never modified, so a failed contribution leaves the
    /// caller's authorization exactly as it was.
    pub fn with_signature(&self, key: &KeyPair, message: &[u8]) -> Result<Self, MultisigError> {
        let public_key = key.public_key();
        let index = self
            .subsigs
            .iter()
            .position(|s| s.key == public_key)
            .ok_or_else(|| MultisigError::NotMember(key.address()))?;

        let mut next = self.clone();
        next.subsigs[index].sig = Some(key.sign(message)?);
        Ok(next)
    }

    /// Combine two authorizations for the same account, slot by slot
    pub fn merge(&self, other: &MultisigSig) -> Result<Self, MultisigError> {
        if self.version != other.version
            || self.threshold != other.threshold
            || self.subsigs.len() != other.subsigs.len()
            || self
                .subsigs
                .iter()
                .zip(&other.subsigs)
                .any(|(a, b)| a.key != b.key)
        {
            return Err(MultisigError::AccountMismatch);
        }

        let mut merged = self.clone();
        for (i, (slot, theirs)) in merged.subsigs.iter_mut().zip(&other.subsigs).enumerate() {
            match (&slot.sig, &theirs.sig) {
                (Some(a), Some(b)) if a != b => {
                    return Err(MultisigError::ConflictingSignatures(i));
                }
                (None, Some(b)) => slot.sig = Some(*b),
                _ => {}
            }
        }
        Ok(merged)
    }

    /// Number of filled slots
    pub fn signature_count(&self) -> usize {
        self.subsigs.iter().filter(|s| s.sig.is_some()).count()
    }

    /// Check if the threshold is reached
    pub fn is_complete(&self) -> bool {
        self.signature_count() >= self.threshold as usize
    }

    /// Keys that have already signed
    pub fn signed_by(&self) -> Vec<PubKey> {
        self.subsigs
            .iter()
            .filter(|s| s.sig.is_some())
            .map(|s| s.key)
            .collect()
    }

    /// The account this authorization belongs to
    pub fn account(&self) -> Result<MultisigAccount, MultisigError> {
        MultisigAccount::new(
            self.version,
            self.threshold,
            self.subsigs.iter().map(|s| s.key).collect(),
        )
    }

    /// Verify every present signature and that the threshold is met
    pub fn verify(&self, message: &[u8]) -> Result<(), MultisigError> {
        self.account()?;

        for (i, slot) in self.subsigs.iter().enumerate() {
            if let Some(sig) = &slot.sig {
                if !slot.key.verify(message, sig) {
                    return Err(MultisigError::InvalidSignature(i));
                }
            }
        }

        if !self.is_complete() {
            return Err(MultisigError::InsufficientSignatures {
                have: self.signature_count(),
                need: self.threshold,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (MultisigAccount, Vec<KeyPair>) {
        let keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let account =
            MultisigAccount::new(1, 2, keys.iter().map(|k| k.public_key()).collect()).unwrap();
        (account, keys)
    }

    #[test]
    fn test_signature_collection() {
        let (account, keys) = setup();
        let message = b"payload";

        let msig = account.blank_sig();
        let msig = msig.with_signature(&keys[0], message).unwrap();
        assert_eq!(msig.signature_count(), 1);
        assert!(!msig.is_complete());

        let msig = msig.with_signature(&keys[2], message).unwrap();
        assert_eq!(msig.signature_count(), 2);
        assert!(msig.is_complete());
        assert_eq!(msig.signed_by(), vec![keys[0].public_key(), keys[2].public_key()]);
        assert!(msig.verify(message).is_ok());
    }

    #[test]
    fn test_duplicate_signature_is_idempotent() {
        let (account, keys) = setup();

        let once = account.blank_sig().with_signature(&keys[0], b"m").unwrap();
        let twice = once.with_signature(&keys[0], b"m").unwrap();

        assert_eq!(twice.signature_count(), 1);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_non_member_leaves_state_unchanged() {
        let (account, keys) = setup();
        let outsider = KeyPair::generate();

        let partial = account.blank_sig().with_signature(&keys[1], b"m").unwrap();
        let before = partial.clone();

        let result = partial.with_signature(&outsider, b"m");
        assert!(matches!(result, Err(MultisigError::NotMember(a)) if a == outsider.address()));
        assert_eq!(partial, before);
    }

    #[test]
    fn test_verify_detects_insufficient_and_bad_signatures() {
        let (account, keys) = setup();

        let partial = account.blank_sig().with_signature(&keys[0], b"m").unwrap();
        assert!(matches!(
            partial.verify(b"m"),
            Err(MultisigError::InsufficientSignatures { have: 1, need: 2 })
        ));

        let complete = partial.with_signature(&keys[1], b"m").unwrap();
        assert!(matches!(
            complete.verify(b"other"),
            Err(MultisigError::InvalidSignature(0))
        ));
    }

    #[test]
    fn test_merge() {
        let (account, keys) = setup();
        let blank = account.blank_sig();

        let a = blank.with_signature(&keys[0], b"m").unwrap();
        let b = blank.with_signature(&keys[2], b"m").unwrap();
        let merged = a.merge(&b).unwrap();

        assert_eq!(merged.signature_count(), 2);
        assert_eq!(merged, b.merge(&a).unwrap());

        let (other_account, _) = setup();
        assert!(matches!(
            a.merge(&other_account.blank_sig()),
            Err(MultisigError::AccountMismatch)
        ));

        let conflicting = blank.with_signature(&keys[0], b"different").unwrap();
        assert!(matches!(
            a.merge(&conflicting),
            Err(MultisigError::ConflictingSignatures(0))
        ));
    }
}
