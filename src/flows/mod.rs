//! End-to-end flows
//!
//! Each flow runs build → authorize → submit → wait against a
//! [`NodeClient`], with its settings passed in as a [`FlowConfig`].

pub mod escrow;
pub mod multisig;
pub mod single;

pub use escrow::{compile_source, escrow_pay, CompileMode, EscrowPayment};
pub use multisig::MultisigFlow;
pub use single::{sign_saved, SingleFlow};

use crate::config::FlowConfig;
use crate::core::{SignedTransaction, SuggestedParams};
use crate::error::Result;
use crate::node::{submit_signed, ConfirmationWatcher, NodeClient, PendingTransactionInfo};
use log::info;
use tokio_util::sync::CancellationToken;

/// A confirmed submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub txid: String,
    pub confirmed_round: u64,
    pub polls: usize,
    /// The node's record of the committed transaction
    pub info: PendingTransactionInfo,
}

impl Confirmation {
    /// Note of the committed transaction, if the node returned one
    pub fn note(&self) -> Option<&[u8]> {
        self.info.txn.as_ref()?.txn.note.as_deref()
    }
}

/// Fetch suggested params, applying the configured flat fee
pub async fn suggested_params<N: NodeClient + ?Sized>(
    node: &N,
    config: &FlowConfig,
) -> Result<SuggestedParams> {
    let params = node.suggested_params().await?;
    Ok(match config.flat_fee {
        Some(fee) => params.with_flat_fee(fee),
        None => params,
    })
}

/// Submit a signed transaction and wait for it to confirm
pub async fn submit_and_wait<N: NodeClient + ?Sized>(
    node: &N,
    config: &FlowConfig,
    stx: &SignedTransaction,
    cancel: CancellationToken,
) -> Result<Confirmation> {
    let txid = submit_signed(node, stx).await?;
    wait_for(node, config, &txid, cancel).await
}

/// Wait for an already-submitted transaction
pub async fn wait_for<N: NodeClient + ?Sized>(
    node: &N,
    config: &FlowConfig,
    txid: &str,
    cancel: CancellationToken,
) -> Result<Confirmation> {
    let mut watcher =
        ConfirmationWatcher::new(node, config.wait_rounds).with_cancellation(cancel);
    if let Some(deadline) = config.wait_deadline() {
        watcher = watcher.with_deadline(deadline);
    }

    let outcome = watcher.wait(txid).await?;
    info!(
        "Transaction {} committed in round {}",
        txid,
        outcome.confirmed_round()
    );
    Ok(Confirmation {
        txid: txid.to_string(),
        confirmed_round: outcome.confirmed_round(),
        polls: outcome.polls,
        info: outcome.info,
    })
}
