//! Logic signatures
//!
//! A logic signature authorizes a transaction with a program and its
//! arguments instead of (or in addition to) a key signature. Used alone, the
//! program is an escrow account whose address is the program hash. Signed by
//! a key or a multisig account, it delegates that account's authority to the
//! program.

use crate::core::codec::CodecError;
use crate::core::{Address, Authorization, SignedTransaction, Transaction};
use crate::crypto::{domain_hash, KeyError, KeyPair, PubKey, Signature, PROGRAM_DOMAIN};
use crate::logic::opcodes::MAX_PROGRAM_VERSION;
use crate::multisig::{MultisigAccount, MultisigError, MultisigSig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Logic signature errors
#[derive(Error, Debug)]
pub enum LogicError {
    #[error("Empty program")]
    EmptyProgram,
    #[error("Unsupported program version: {0}")]
    UnsupportedVersion(u8),
    #[error("Transaction sender {sender} is not the authorizing address {expected}")]
    SenderMismatch { sender: Address, expected: Address },
    #[error("Logic signature is already delegated by a different account")]
    DelegationMismatch,
    #[error("Invalid delegation signature")]
    InvalidDelegation,
    #[error("Multisig error: {0}")]
    Multisig(#[from] MultisigError),
    #[error("Crypto error: {0}")]
    Crypto(#[from] KeyError),
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Escrow address of a program: `SHA-512/256("Program" || program)`
pub fn escrow_address(program: &[u8]) -> Address {
    Address::new(domain_hash(PROGRAM_DOMAIN, program))
}

/// Bytes a delegating key signs: `"Program" || program`
fn delegation_message(program: &[u8]) -> Vec<u8> {
    let mut message = PROGRAM_DOMAIN.to_vec();
    message.extend_from_slice(program);
    message
}

/// A compiled program and its escrow address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledProgram {
    pub program: Vec<u8>,
    pub hash: Address,
}

impl CompiledProgram {
    pub fn new(program: Vec<u8>) -> Self {
        let hash = escrow_address(&program);
        Self { program, hash }
    }
}

/// Encode an integer argument (8 bytes, big-endian) as read by `btoi`
pub fn arg_u64(value: u64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

/// Encode a string argument
pub fn arg_str(value: &str) -> Vec<u8> {
    value.as_bytes().to_vec()
}

/// Account that signed the program, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delegation {
    Single { signer: PubKey, sig: Signature },
    Multisig(MultisigSig),
}

/// Program plus arguments, optionally delegated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicSig {
    pub program: Vec<u8>,
    pub args: Vec<Vec<u8>>,
    pub delegation: Option<Delegation>,
}

impl LogicSig {
    /// Create a contract-only logic signature
    pub fn new(program: Vec<u8>, args: Vec<Vec<u8>>) -> Result<Self, LogicError> {
        let version = *program.first().ok_or(LogicError::EmptyProgram)?;
        if version == 0 || version > MAX_PROGRAM_VERSION {
            return Err(LogicError::UnsupportedVersion(version));
        }
        Ok(Self {
            program,
            args,
            delegation: None,
        })
    }

    /// Address of the program as an escrow account
    pub fn escrow_address(&self) -> Address {
        escrow_address(&self.program)
    }

    /// Delegate a single key's authority to this program
    pub fn delegate_single(&self, key: &KeyPair) -> Result<Self, LogicError> {
        if self.delegation.is_some() {
            return Err(LogicError::DelegationMismatch);
        }
        let sig = key.sign(&delegation_message(&self.program))?;
        Ok(Self {
            delegation: Some(Delegation::Single {
                signer: key.public_key(),
                sig,
            }),
            ..self.clone()
        })
    }

    /// Add one member's signature to a multisig delegation
    ///
    /// Starts a new delegation when none exists; appends otherwise.
    pub fn delegate_multisig(
        &self,
        key: &KeyPair,
        account: &MultisigAccount,
    ) -> Result<Self, LogicError> {
        let msig = match &self.delegation {
            None => account.blank_sig(),
            Some(Delegation::Multisig(msig)) if account.matches(msig) => msig.clone(),
            Some(_) => return Err(LogicError::DelegationMismatch),
        };
        let msig = msig.with_signature(key, &delegation_message(&self.program))?;
        Ok(Self {
            delegation: Some(Delegation::Multisig(msig)),
            ..self.clone()
        })
    }

    /// Address this logic signature can authorize transactions for
    pub fn authorizer(&self) -> Result<Address, LogicError> {
        match &self.delegation {
            None => Ok(self.escrow_address()),
            Some(Delegation::Single { signer, .. }) => Ok(signer.address()),
            Some(Delegation::Multisig(msig)) => Ok(msig.account()?.address()),
        }
    }

    pub fn is_delegated(&self) -> bool {
        self.delegation.is_some()
    }

    /// Check the delegation signature(s), if any
    pub fn verify(&self) -> Result<(), LogicError> {
        let message = delegation_message(&self.program);
        match &self.delegation {
            None => Ok(()),
            Some(Delegation::Single { signer, sig }) => {
                if signer.verify(&message, sig) {
                    Ok(())
                } else {
                    Err(LogicError::InvalidDelegation)
                }
            }
            Some(Delegation::Multisig(msig)) => Ok(msig.verify(&message)?),
        }
    }

    /// Attach this logic signature to a transaction
    ///
    /// The sender must be the escrow address for a contract-only signature,
    /// or the delegating account otherwise.
    pub fn authorize(&self, txn: &Transaction) -> Result<SignedTransaction, LogicError> {
        let expected = self.authorizer()?;
        if txn.sender != expected {
            return Err(LogicError::SenderMismatch {
                sender: txn.sender,
                expected,
            });
        }
        Ok(SignedTransaction {
            txn: txn.clone(),
            auth: Authorization::Logic(self.clone()),
        })
    }
}

/// Authorize a transaction with a logic signature
///
/// Returns the transaction id and the encoded signed transaction.
pub fn sign_logic_transaction(
    lsig: &LogicSig,
    txn: &Transaction,
) -> Result<(String, Vec<u8>), LogicError> {
    let signed = lsig.authorize(txn)?;
    Ok((signed.id()?, signed.encode()?))
}
