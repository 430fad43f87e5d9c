//! Transaction submission
//!
//! Submission is a single attempt; rejections are returned to the caller.

use crate::core::{Authorization, SignedTransaction};
use crate::node::{NodeClient, NodeError};
use log::{info, warn};

/// Submit already-encoded signed transaction bytes
pub async fn submit_raw<N: NodeClient + ?Sized>(
    node: &N,
    bytes: &[u8],
) -> Result<String, NodeError> {
    if bytes.is_empty() {
        return Err(NodeError::InvalidRequest(
            "refusing to submit an empty transaction".to_string(),
        ));
    }
    let txid = node.submit_raw(bytes).await?;
    info!("📤 Submitted transaction {}", txid);
    Ok(txid)
}

/// Encode and submit a signed transaction
pub async fn submit_signed<N: NodeClient + ?Sized>(
    node: &N,
    stx: &SignedTransaction,
) -> Result<String, NodeError> {
    if let Authorization::Unsigned = stx.auth {
        return Err(NodeError::InvalidRequest(
            "transaction has no authorization".to_string(),
        ));
    }

    let local_id = stx.id()?;
    let txid = submit_raw(node, &stx.encode()?).await?;
    if txid != local_id {
        warn!(
            "Node reported transaction id {} but the local id is {}",
            txid, local_id
        );
    }
    Ok(txid)
}
