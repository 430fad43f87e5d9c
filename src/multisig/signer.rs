//! Signing transactions from a multisig account
//!
//! Starting a new authorization and appending to an existing one are the
//! same step: [`MultisigSigner::contribute`] treats an unsigned transaction as
//! an authorization with every slot empty. [`MultisigSigner::fold`] runs that
//! step over any sequence of member keys.

use crate::core::{Authorization, SignedTransaction, Transaction};
use crate::crypto::KeyPair;
use crate::multisig::account::{MultisigAccount, MultisigError};
use crate::multisig::signature::MultisigSig;
use log::debug;

/// Accumulates member signatures for one multisig account
#[derive(Debug, Clone, Copy)]
pub struct MultisigSigner<'a> {
    account: &'a MultisigAccount,
}

impl<'a> MultisigSigner<'a> {
    pub fn new(account: &'a MultisigAccount) -> Self {
        Self { account }
    }

    pub fn account(&self) -> &MultisigAccount {
        self.account
    }

    /// Add one member's signature, returning the new signed transaction
    ///
    /// `current` is not touched; on error the caller still holds the exact
    /// authorization it passed in.
    pub fn contribute(
        &self,
        current: &SignedTransaction,
        key: &KeyPair,
    ) -> Result<SignedTransaction, MultisigError> {
        let account_address = self.account.address();
        if current.txn.sender != account_address {
            return Err(MultisigError::SenderMismatch {
                sender: current.txn.sender,
                account: account_address,
            });
        }

        let msig = match &current.auth {
            Authorization::Unsigned => self.account.blank_sig(),
            Authorization::Multisig(msig) if self.account.matches(msig) => msig.clone(),
            Authorization::Multisig(_) => return Err(MultisigError::AccountMismatch),
            other => return Err(MultisigError::NotMultisig(other.kind())),
        };

        let msig = msig.with_signature(key, &current.txn.signing_bytes()?)?;
        debug!(
            "Multisig {} collected {}/{} signatures",
            self.account.description(),
            msig.signature_count(),
            msig.threshold
        );

        Ok(SignedTransaction {
            txn: current.txn.clone(),
            auth: Authorization::Multisig(msig),
        })
    }

    /// Fold a sequence of member keys into one authorization
    pub fn fold<'k, I>(
        &self,
        start: SignedTransaction,
        keys: I,
    ) -> Result<SignedTransaction, MultisigError>
    where
        I: IntoIterator<Item = &'k KeyPair>,
    {
        keys.into_iter()
            .try_fold(start, |acc, key| self.contribute(&acc, key))
    }
}

// ===== Byte-level operations =====

/// Sign an unsigned transaction, starting a new multisig authorization
///
/// Returns the transaction id and the encoded signed transaction.
pub fn sign_multisig(
    key: &KeyPair,
    account: &MultisigAccount,
    txn: &Transaction,
) -> Result<(String, Vec<u8>), MultisigError> {
    let signed = MultisigSigner::new(account)
        .contribute(&SignedTransaction::unsigned(txn.clone()), key)?;
    Ok((signed.id()?, signed.encode()?))
}

/// Append one more signature to an encoded multisig transaction
pub fn append_multisig(
    key: &KeyPair,
    account: &MultisigAccount,
    signed_bytes: &[u8],
) -> Result<(String, Vec<u8>), MultisigError> {
    let current = SignedTransaction::decode(signed_bytes)?;
    if let Authorization::Unsigned = current.auth {
        return Err(MultisigError::NotMultisig(current.auth.kind()));
    }
    let signed = MultisigSigner::new(account).contribute(&current, key)?;
    Ok((signed.id()?, signed.encode()?))
}

/// Merge independently signed copies of the same multisig transaction
pub fn merge_multisig<B: AsRef<[u8]>>(blobs: &[B]) -> Result<(String, Vec<u8>), MultisigError> {
    let mut decoded = blobs
        .iter()
        .map(|blob| SignedTransaction::decode(blob.as_ref()));

    let first = decoded.next().ok_or(MultisigError::EmptyMerge)??;
    let mut msig = expect_multisig(&first)?.clone();

    for next in decoded {
        let next = next?;
        if next.txn != first.txn {
            return Err(MultisigError::TransactionMismatch);
        }
        msig = msig.merge(expect_multisig(&next)?)?;
    }

    let merged = SignedTransaction {
        txn: first.txn,
        auth: Authorization::Multisig(msig),
    };
    Ok((merged.id()?, merged.encode()?))
}

fn expect_multisig(stx: &SignedTransaction) -> Result<&MultisigSig, MultisigError> {
    match &stx.auth {
        Authorization::Multisig(msig) => Ok(msig),
        other => Err(MultisigError::NotMultisig(other.kind())),
    }
}

/// Verify the multisig authorization of a signed transaction
pub fn verify_multisig(stx: &SignedTransaction) -> Result<(), MultisigError> {
    let msig = expect_multisig(stx)?;
    let account = msig.account()?;
    if account.address() != stx.txn.sender {
        return Err(MultisigError::SenderMismatch {
            sender: stx.txn.sender,
            account: account.address(),
        });
    }
    msig.verify(&stx.txn.signing_bytes()?)
}
