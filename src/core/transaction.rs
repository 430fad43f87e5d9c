//! Payment transactions
//!
//! A transaction is built once from network-supplied parameters and never
//! mutated afterwards. Authorization is attached by wrapping it in a
//! [`SignedTransaction`]; the transaction id only covers the unsigned body,
//! so it is the same however (and in whatever order) the body gets signed.

use crate::core::codec::{self, CodecError};
use crate::core::Address;
use crate::crypto::{domain_hash_hex, KeyError, KeyPair, PubKey, Signature, TX_DOMAIN};
use crate::logic::LogicSig;
use crate::multisig::MultisigSig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum number of rounds between first and last valid round
pub const MAX_TXN_LIFE: u64 = 1000;

/// Bytes a single-key authorization adds to an encoded transaction
/// (variant tag + compressed key + compact signature)
pub const SIGNATURE_OVERHEAD: usize = 1 + 33 + 64;

// =============================================================================
// Error Types
// =============================================================================

/// Transaction-related errors
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Invalid validity window: first {first} > last {last}")]
    InvertedWindow { first: u64, last: u64 },
    #[error("Validity window of {0} rounds exceeds the maximum transaction life")]
    WindowTooLong(u64),
    #[error("Signer {signer} does not control sender {sender}")]
    SenderMismatch { signer: Address, sender: Address },
    #[error("Expected {expected} authorization, found {found}")]
    WrongAuthorization {
        expected: &'static str,
        found: &'static str,
    },
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("Crypto error: {0}")]
    Crypto(#[from] KeyError),
}

// =============================================================================
// Suggested Parameters
// =============================================================================

/// Network-supplied parameters for building a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedParams {
    /// Fee per byte, or the absolute fee when `flat_fee` is set
    pub fee: u64,
    /// Minimum fee the network accepts
    pub min_fee: u64,
    pub flat_fee: bool,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub genesis_hash: [u8; 32],
}

impl SuggestedParams {
    /// Switch to an absolute fee, overriding the node's per-byte suggestion
    pub fn with_flat_fee(mut self, fee: u64) -> Self {
        self.flat_fee = true;
        self.fee = fee;
        self
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A payment transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: Address,
    pub receiver: Address,
    pub amount: u64,
    pub fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub genesis_hash: [u8; 32],
    /// Arbitrary note bytes; `Some(vec![])` and `None` are distinct
    pub note: Option<Vec<u8>>,
    /// Group id binding this transaction to an atomic group
    pub group: Option<[u8; 32]>,
    /// Lease that prevents replays with the same (sender, lease) pair
    pub lease: Option<[u8; 32]>,
    /// Close the sender account and send the remainder here
    pub close_remainder_to: Option<Address>,
}

impl Transaction {
    /// Canonical bytes of the unsigned body
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        codec::encode(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        codec::decode(bytes)
    }

    /// Bytes covered by every signature over this transaction: `"TX" || body`
    pub fn signing_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut bytes = TX_DOMAIN.to_vec();
        bytes.extend(self.encode()?);
        Ok(bytes)
    }

    /// Transaction id: hex of SHA-512/256 over the domain-prefixed body
    pub fn id(&self) -> Result<String, CodecError> {
        Ok(domain_hash_hex(TX_DOMAIN, &self.encode()?))
    }

    /// Size of the transaction once a single signature is attached
    pub fn estimate_size(&self) -> Result<usize, CodecError> {
        Ok(self.encode()?.len() + SIGNATURE_OVERHEAD)
    }

    /// Check the validity window bounds
    pub fn check_window(&self) -> Result<(), TransactionError> {
        check_window(self.first_valid, self.last_valid)
    }

    /// Sign with the sender's own key
    pub fn sign(&self, key: &KeyPair) -> Result<SignedTransaction, TransactionError> {
        if key.address() != self.sender {
            return Err(TransactionError::SenderMismatch {
                signer: key.address(),
                sender: self.sender,
            });
        }
        let sig = key.sign(&self.signing_bytes()?)?;
        Ok(SignedTransaction {
            txn: self.clone(),
            auth: Authorization::Single {
                signer: key.public_key(),
                sig,
            },
        })
    }
}

fn check_window(first: u64, last: u64) -> Result<(), TransactionError> {
    if first > last {
        return Err(TransactionError::InvertedWindow { first, last });
    }
    if last - first > MAX_TXN_LIFE {
        return Err(TransactionError::WindowTooLong(last - first));
    }
    Ok(())
}

// =============================================================================
// Transaction Builder
// =============================================================================

/// Builder for payment transactions
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    params: SuggestedParams,
    sender: Option<Address>,
    receiver: Option<Address>,
    amount: u64,
    note: Option<Vec<u8>>,
    group: Option<[u8; 32]>,
    lease: Option<[u8; 32]>,
    close_remainder_to: Option<Address>,
}

impl TransactionBuilder {
    /// Start a payment from suggested params
    pub fn payment(params: SuggestedParams) -> Self {
        Self {
            params,
            sender: None,
            receiver: None,
            amount: 0,
            note: None,
            group: None,
            lease: None,
            close_remainder_to: None,
        }
    }

    pub fn sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn receiver(mut self, receiver: Address) -> Self {
        self.receiver = Some(receiver);
        self
    }

    pub fn amount(mut self, amount: u64) -> Self {
        self.amount = amount;
        self
    }

    pub fn note(mut self, note: impl Into<Vec<u8>>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn group(mut self, group: [u8; 32]) -> Self {
        self.group = Some(group);
        self
    }

    pub fn lease(mut self, lease: [u8; 32]) -> Self {
        self.lease = Some(lease);
        self
    }

    pub fn close_remainder_to(mut self, to: Address) -> Self {
        self.close_remainder_to = Some(to);
        self
    }

    /// Build the transaction, computing the fee from the params
    ///
    /// With a flat fee the params' fee is used as-is. Otherwise the fee is
    /// `fee_per_byte * estimated_size`, raised to the network minimum.
    pub fn build(self) -> Result<Transaction, TransactionError> {
        let sender = self.sender.ok_or(TransactionError::MissingField("sender"))?;
        let receiver = self
            .receiver
            .ok_or(TransactionError::MissingField("receiver"))?;
        check_window(self.params.first_valid, self.params.last_valid)?;

        let mut tx = Transaction {
            sender,
            receiver,
            amount: self.amount,
            fee: 0,
            first_valid: self.params.first_valid,
            last_valid: self.params.last_valid,
            genesis_id: self.params.genesis_id,
            genesis_hash: self.params.genesis_hash,
            note: self.note,
            group: self.group,
            lease: self.lease,
            close_remainder_to: self.close_remainder_to,
        };

        tx.fee = if self.params.flat_fee {
            self.params.fee
        } else {
            // The fee field itself counts towards the size; take the size with
            // the largest varint it could need.
            tx.fee = u64::MAX;
            let size = tx.estimate_size()? as u64;
            self.params
                .fee
                .saturating_mul(size)
                .max(self.params.min_fee)
        };

        Ok(tx)
    }
}

// =============================================================================
// Signed Transaction
// =============================================================================

/// Authorization attached to a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Authorization {
    /// No authorization yet; used for files handed to offline signers
    Unsigned,
    /// Signature by the sender's own key
    Single { signer: PubKey, sig: Signature },
    /// Accumulated k-of-n multisig authorization
    Multisig(MultisigSig),
    /// Program-based authorization
    Logic(LogicSig),
}

impl Authorization {
    pub fn kind(&self) -> &'static str {
        match self {
            Authorization::Unsigned => "unsigned",
            Authorization::Single { .. } => "single",
            Authorization::Multisig(_) => "multisig",
            Authorization::Logic(_) => "logic",
        }
    }
}

/// A transaction together with its authorization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub txn: Transaction,
    pub auth: Authorization,
}

impl SignedTransaction {
    /// Wrap a transaction with no authorization
    pub fn unsigned(txn: Transaction) -> Self {
        Self {
            txn,
            auth: Authorization::Unsigned,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        codec::encode(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        codec::decode(bytes)
    }

    pub fn id(&self) -> Result<String, CodecError> {
        self.txn.id()
    }

    /// Check a single-key authorization: the signer owns the sender and the
    /// signature covers this transaction
    pub fn verify_single(&self) -> Result<(), TransactionError> {
        let (signer, sig) = match &self.auth {
            Authorization::Single { signer, sig } => (signer, sig),
            other => {
                return Err(TransactionError::WrongAuthorization {
                    expected: "single",
                    found: other.kind(),
                })
            }
        };
        if signer.address() != self.txn.sender {
            return Err(TransactionError::SenderMismatch {
                signer: signer.address(),
                sender: self.txn.sender,
            });
        }
        if !signer.verify(&self.txn.signing_bytes()?, sig) {
            return Err(KeyError::InvalidSignature.into());
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
