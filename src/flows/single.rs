//! Offline single-key payment flow
//!
//! The signing key never has to be on a machine that talks to the node:
//! `save_unsigned` writes `unsigned.txn` online, `sign` turns it into
//! `signed.stxn` offline, and `send` submits that file and waits.

use crate::config::FlowConfig;
use crate::core::{Address, SignedTransaction, Transaction, TransactionBuilder};
use crate::crypto::KeyPair;
use crate::error::Result;
use crate::flows::{submit_and_wait, suggested_params, Confirmation};
use crate::node::NodeClient;
use crate::storage::TxFiles;
use log::info;
use tokio_util::sync::CancellationToken;

/// Single-key flow over one data directory
pub struct SingleFlow<'a, N: NodeClient + ?Sized> {
    node: &'a N,
    config: &'a FlowConfig,
    files: TxFiles,
}

impl<'a, N: NodeClient + ?Sized> SingleFlow<'a, N> {
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

    /// Build a payment from `sender` and save it unsigned
    pub async fn save_unsigned(
        &self,
        sender: Address,
        receiver: Address,
        amount: u64,
        note: Option<Vec<u8>>,
    ) -> Result<Transaction> {
        let params = suggested_params(self.node, self.config).await?;

        let mut builder = TransactionBuilder::payment(params)
            .sender(sender)
            .receiver(receiver)
            .amount(amount);
        if let Some(note) = note {
            builder = builder.note(note);
        }
        let txn = builder.build()?;

        self.files.save_unsigned(&txn)?;
        self.files.remove_signed()?;

        info!("💾 Saved unsigned payment {} from {}", txn.id()?, sender);
        Ok(txn)
    }

    /// Sign `unsigned.txn` with the sender's key and write `signed.stxn`
    pub fn sign(&self, key: &KeyPair) -> Result<String> {
        Ok(sign_saved(&self.files, key)?.id()?)
    }

    /// Submit `signed.stxn` and wait for confirmation
    pub async fn send(&self, cancel: CancellationToken) -> Result<Confirmation> {
        let stx = self.files.load_signed()?;
        stx.verify_single()?;
        submit_and_wait(self.node, self.config, &stx, cancel).await
    }

    /// Run every step in one process
    pub async fn run(
        &self,
        key: &KeyPair,
        receiver: Address,
        amount: u64,
        note: Option<Vec<u8>>,
        cancel: CancellationToken,
    ) -> Result<Confirmation> {
        self.save_unsigned(key.address(), receiver, amount, note)
            .await?;
        self.sign(key)?;
        self.send(cancel).await
    }
}

/// Signing step on its own; it touches only the files, never the node
pub fn sign_saved(files: &TxFiles, key: &KeyPair) -> Result<SignedTransaction> {
    let txn = files.load_unsigned()?;
    let stx = txn.sign(key)?;
    files.save_signed(&stx)?;

    info!("✍️  {} signed {}", key.address(), stx.id()?);
    Ok(stx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Authorization;
    use crate::error::Error;
    use crate::node::mock::MockNode;
    use crate::storage::{SIGNED_TXN_FILE, UNSIGNED_TXN_FILE};
    use tempfile::tempdir;

    fn config(dir: &std::path::Path) -> FlowConfig {
        FlowConfig {
            data_dir: dir.to_path_buf(),
            flat_fee: None,
            wait_rounds: 5,
            wait_deadline_secs: None,
        }
    }

    #[tokio::test]
    async fn test_offline_steps_end_to_end() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        let node = MockNode::new(1000).auto_confirm();
        let key = KeyPair::generate();

        // Online: build and save
        let flow = SingleFlow::new(&node, &config).unwrap();
        let txn = flow
            .save_unsigned(key.address(), Address::new([7u8; 32]), 10_000, Some(b"offline".to_vec()))
            .await
            .unwrap();
        assert_eq!(txn.fee, 1000);
        assert!(flow.files().exists(UNSIGNED_TXN_FILE));
        assert!(!flow.files().exists(SIGNED_TXN_FILE));

        // Offline: a separate process signs
        let flow = SingleFlow::new(&node, &config).unwrap();
        let txid = flow.sign(&key).unwrap();
        assert_eq!(txid, txn.id().unwrap());
        assert!(matches!(
            flow.files().load_signed().unwrap().auth,
            Authorization::Single { .. }
        ));
        assert!(node.submitted().is_empty());

        // Online again: submit and wait
        let confirmation = flow.send(CancellationToken::new()).await.unwrap();
        assert_eq!(confirmation.txid, txid);
        assert_eq!(node.submitted().len(), 1);
        assert_eq!(confirmation.info.txn.as_ref().map(|s| &s.txn), Some(&txn));
        assert_eq!(confirmation.note(), Some(&b"offline"[..]));
    }

    #[tokio::test]
    async fn test_wrong_key_cannot_sign() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        let node = MockNode::new(10);
        let key = KeyPair::generate();

        let flow = SingleFlow::new(&node, &config).unwrap();
        flow.save_unsigned(key.address(), Address::new([7u8; 32]), 1, None)
            .await
            .unwrap();

        let err = flow.sign(&KeyPair::generate()).unwrap_err();
        assert!(matches!(err, Error::AuthorizationMismatch(_)));
        assert!(!flow.files().exists(SIGNED_TXN_FILE));
    }

    #[tokio::test]
    async fn test_send_rejects_tampered_file() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        let node = MockNode::new(10).auto_confirm();
        let key = KeyPair::generate();

        let flow = SingleFlow::new(&node, &config).unwrap();
        flow.save_unsigned(key.address(), Address::new([7u8; 32]), 1, None)
            .await
            .unwrap();
        flow.sign(&key).unwrap();

        let mut stx = flow.files().load_signed().unwrap();
        stx.txn.amount = 1_000_000;
        flow.files().save_signed(&stx).unwrap();

        let err = flow.send(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::AuthorizationMismatch(_)));
        assert!(node.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_send_without_signature_fails() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        let node = MockNode::new(10);

        let flow = SingleFlow::new(&node, &config).unwrap();
        let err = flow.send(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_run_in_one_process() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        let node = MockNode::new(50).auto_confirm();
        let key = KeyPair::generate();

        let flow = SingleFlow::new(&node, &config).unwrap();
        let confirmation = flow
            .run(&key, Address::new([7u8; 32]), 1, None, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(confirmation.polls, 1);
        assert_eq!(node.submitted()[0].txn.sender, key.address());
    }
}
