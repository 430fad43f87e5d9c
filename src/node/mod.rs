//! Node client
//!
//! [`NodeClient`] is the seam between the flows and a running node. The
//! production implementation is [`HttpNode`], which talks to the node's REST
//! API; tests use an in-process mock.
//!
//! - `submit`: submitting signed transactions
//! - `watcher`: polling a transaction until it confirms

pub mod http;
pub mod submit;
pub mod watcher;

#[cfg(test)]
pub(crate) mod mock;

pub use http::HttpNode;
pub use submit::{submit_raw, submit_signed};
pub use watcher::{ConfirmationWatcher, WatchError, WatchOutcome, WatchState};

use crate::core::{CodecError, SignedTransaction, SuggestedParams};
use crate::logic::CompiledProgram;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors talking to a node
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Node rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Node status summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    /// Last round the node has committed
    pub last_round: u64,
}

/// What the node knows about a submitted transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransactionInfo {
    /// Round the transaction was committed in; 0 while still pending
    pub confirmed_round: u64,
    /// Non-empty when the pool dropped the transaction
    pub pool_error: String,
    /// The signed transaction as the node saw it
    pub txn: Option<SignedTransaction>,
}

impl PendingTransactionInfo {
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_round > 0
    }

    pub fn is_rejected(&self) -> bool {
        !self.pool_error.is_empty()
    }
}

/// Operations the flows need from a node
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Current node status
    async fn status(&self) -> Result<NodeStatus, NodeError>;

    /// Block until the node has seen a round after `round`
    async fn status_after_round(&self, round: u64) -> Result<NodeStatus, NodeError>;

    /// Look up a submitted transaction
    async fn pending_transaction_info(
        &self,
        txid: &str,
    ) -> Result<PendingTransactionInfo, NodeError>;

    /// Submit encoded signed transaction bytes, returning the transaction id
    async fn submit_raw(&self, bytes: &[u8]) -> Result<String, NodeError>;

    /// Fetch fee and validity window suggestions
    async fn suggested_params(&self) -> Result<SuggestedParams, NodeError>;

    /// Compile script source on the node
    async fn compile(&self, source: &str) -> Result<CompiledProgram, NodeError>;
}
