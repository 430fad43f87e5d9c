//! Offline multisig payment flow
//!
//! 1. `save_unsigned` builds a payment from the multisig address and writes
//!    `unsigned.txn` and `ma.txn`.
//! 2. Each member runs `sign`, which starts or extends `signed.stxn`.
//! 3. `send` checks the threshold, submits and waits for confirmation.
//!
//! The steps can run in different processes; only the files are shared.

use crate::config::FlowConfig;
use crate::core::{Address, Authorization, SignedTransaction, Transaction, TransactionBuilder};
use crate::crypto::KeyPair;
use crate::error::{Error, Result};
use crate::flows::{submit_and_wait, suggested_params, Confirmation};
use crate::multisig::{
    append_multisig, sign_multisig, verify_multisig, MultisigAccount, MultisigError,
};
use crate::node::NodeClient;
use crate::storage::{TxFiles, SIGNED_TXN_FILE};
use log::info;
use tokio_util::sync::CancellationToken;

/// Multisig flow over one data directory
pub struct MultisigFlow<'a, N: NodeClient + ?Sized> {
    node: &'a N,
    config: &'a FlowConfig,
    files: TxFiles,
}

impl<'a, N: NodeClient + ?Sized> MultisigFlow<'a, N> {
    pub fn new(node: &'a N, config: &'a FlowConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            node,
            config,
            files: TxFiles::new(&config.data_dir)?,
        })
    }

    pub fn files(&self) -> &TxFiles {
        &self.files
    }

    /// Build a payment from the multisig account and save it for signing
    pub async fn save_unsigned(
        &self,
        account: &MultisigAccount,
        receiver: Address,
        amount: u64,
        note: Option<Vec<u8>>,
    ) -> Result<Transaction> {
        let params = suggested_params(self.node, self.config).await?;

        let mut builder = TransactionBuilder::payment(params)
            .sender(account.address())
            .receiver(receiver)
            .amount(amount);
        if let Some(note) = note {
            builder = builder.note(note);
        }
        let txn = builder.build()?;

        self.files.save_unsigned(&txn)?;
        self.files.save_account(account)?;
        // A new transaction invalidates any earlier signatures
        self.files.remove_signed()?;

        info!(
            "💾 Saved unsigned payment {} from {} ({})",
            txn.id()?,
            account.address(),
            account.description()
        );
        Ok(txn)
    }

    /// Add `key`'s signature to `signed.stxn`, creating it on first use
    ///
    /// Returns the transaction id and how many signatures are now present.
    pub fn sign(&self, key: &KeyPair) -> Result<(String, usize)> {
        let account = self.files.load_account()?;
        let txn = self.files.load_unsigned()?;

        let (txid, blob) = if self.files.exists(SIGNED_TXN_FILE) {
            let current = self.files.load_signed_bytes()?;
            if SignedTransaction::decode(&current)?.txn != txn {
                return Err(MultisigError::TransactionMismatch.into());
            }
            append_multisig(key, &account, &current)?
        } else {
            sign_multisig(key, &account, &txn)?
        };

        self.files.save_signed_bytes(&blob)?;
        let count = signature_count(&SignedTransaction::decode(&blob)?);
        info!(
            "✍️  {} signed {} ({}/{} signatures)",
            key.address(),
            txid,
            count,
            account.threshold()
        );
        Ok((txid, count))
    }

    /// Submit `signed.stxn` and wait for confirmation
    pub async fn send(&self, cancel: CancellationToken) -> Result<Confirmation> {
        let stx = self.files.load_signed()?;
        verify_multisig(&stx)?;
        submit_and_wait(self.node, self.config, &stx, cancel).await
    }

    /// Run every step in one process
    pub async fn run(
        &self,
        account: &MultisigAccount,
        signers: &[KeyPair],
        receiver: Address,
        amount: u64,
        note: Option<Vec<u8>>,
        cancel: CancellationToken,
    ) -> Result<Confirmation> {
        if signers.len() < account.threshold() as usize {
            return Err(Error::InvalidArgument(format!(
                "{} signers given for a {} account",
                signers.len(),
                account.description()
            )));
        }
        self.save_unsigned(account, receiver, amount, note).await?;
        for key in signers {
            self.sign(key)?;
        }
        self.send(cancel).await
    }
}

fn signature_count(stx: &SignedTransaction) -> usize {
    match &stx.auth {
        Authorization::Multisig(msig) => msig.signature_count(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::mock::MockNode;
    use crate::storage::{MULTISIG_ACCOUNT_FILE, UNSIGNED_TXN_FILE};
    use tempfile::tempdir;

    fn setup(k: u8, n: usize) -> (MultisigAccount, Vec<KeyPair>) {
        let keys: Vec<KeyPair> = (0..n).map(|_| KeyPair::generate()).collect();
        let account =
            MultisigAccount::new(1, k, keys.iter().map(|kp| kp.public_key()).collect()).unwrap();
        (account, keys)
    }

    fn config(dir: &std::path::Path) -> FlowConfig {
        FlowConfig {
            data_dir: dir.to_path_buf(),
            flat_fee: Some(1000),
            wait_rounds: 5,
            wait_deadline_secs: None,
        }
    }

    #[tokio::test]
    async fn test_offline_steps_end_to_end() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        let node = MockNode::new(1000).auto_confirm();
        let (account, keys) = setup(2, 3);

        let flow = MultisigFlow::new(&node, &config).unwrap();
        let txn = flow
            .save_unsigned(&account, Address::new([7u8; 32]), 500, Some(b"hello".to_vec()))
            .await
            .unwrap();
        assert_eq!(txn.fee, 1000);
        assert!(flow.files().exists(UNSIGNED_TXN_FILE));
        assert!(flow.files().exists(MULTISIG_ACCOUNT_FILE));

        // Not enough signatures yet
        let (txid, count) = flow.sign(&keys[2]).unwrap();
        assert_eq!(count, 1);
        assert_eq!(txid, txn.id().unwrap());
        let err = flow.send(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::AuthorizationMismatch(_)));
        assert!(node.submitted().is_empty());

        // A second process picks up the file and completes it
        let flow = MultisigFlow::new(&node, &config).unwrap();
        let (_, count) = flow.sign(&keys[0]).unwrap();
        assert_eq!(count, 2);

        let confirmation = flow.send(CancellationToken::new()).await.unwrap();
        assert_eq!(confirmation.txid, txid);
        assert!(confirmation.confirmed_round > 0);
        assert_eq!(node.submitted().len(), 1);

        // The node's record carries the submitted transaction and its note
        let committed = confirmation.info.txn.as_ref().unwrap();
        assert_eq!(committed.txn, txn);
        assert_eq!(committed, &node.submitted()[0]);
        assert_eq!(confirmation.note(), Some(&b"hello"[..]));
    }

    #[tokio::test]
    async fn test_run_in_one_process() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        let node = MockNode::new(50).auto_confirm();
        let (account, keys) = setup(2, 3);

        let flow = MultisigFlow::new(&node, &config).unwrap();
        let confirmation = flow
            .run(
                &account,
                &keys[1..],
                Address::new([7u8; 32]),
                1,
                None,
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(confirmation.polls, 1);

        let err = flow
            .run(
                &account,
                &keys[..1],
                Address::new([7u8; 32]),
                1,
                None,
                CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_non_member_cannot_sign() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        let node = MockNode::new(50);
        let (account, keys) = setup(2, 3);

        let flow = MultisigFlow::new(&node, &config).unwrap();
        flow.save_unsigned(&account, Address::new([7u8; 32]), 1, None)
            .await
            .unwrap();
        flow.sign(&keys[0]).unwrap();
        let before = flow.files().load_signed_bytes().unwrap();

        let err = flow.sign(&KeyPair::generate()).unwrap_err();
        assert!(matches!(err, Error::AuthorizationMismatch(_)));
        assert_eq!(flow.files().load_signed_bytes().unwrap(), before);
    }

    #[tokio::test]
    async fn test_new_payment_drops_old_signatures() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        let node = MockNode::new(50);
        let (account, keys) = setup(2, 3);

        let flow = MultisigFlow::new(&node, &config).unwrap();
        flow.save_unsigned(&account, Address::new([7u8; 32]), 1, None)
            .await
            .unwrap();
        flow.sign(&keys[0]).unwrap();
        assert!(flow.files().exists(SIGNED_TXN_FILE));

        let txn = flow
            .save_unsigned(&account, Address::new([8u8; 32]), 2, None)
            .await
            .unwrap();
        assert!(!flow.files().exists(SIGNED_TXN_FILE));

        let (txid, count) = flow.sign(&keys[1]).unwrap();
        assert_eq!(count, 1);
        assert_eq!(txid, txn.id().unwrap());
    }

    #[tokio::test]
    async fn test_unconfirmed_times_out() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        // Never auto-confirms
        let node = MockNode::new(50);
        let (account, keys) = setup(1, 2);

        let flow = MultisigFlow::new(&node, &config).unwrap();
        let err = flow
            .run(
                &account,
                &keys[..1],
                Address::new([7u8; 32]),
                1,
                None,
                CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::TimedOut {
                start_round: 51,
                timeout: 5
            }
        ));
    }

    #[tokio::test]
    async fn test_rejects_zero_wait_rounds() {
        let dir = tempdir().unwrap();
        let mut config = config(dir.path());
        config.wait_rounds = 0;
        let node = MockNode::new(50);
        assert!(matches!(
            MultisigFlow::new(&node, &config),
            Err(Error::InvalidArgument(_))
        ));
    }
}
