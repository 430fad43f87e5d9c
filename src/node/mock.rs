//! In-process node for tests

use crate::core::{SignedTransaction, SuggestedParams};
use crate::logic::{assemble, CompiledProgram};
use crate::node::{NodeClient, NodeError, NodeStatus, PendingTransactionInfo};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scripted node: each poll pops the next queued response; once the queue is
/// empty, submitted transactions confirm (when `auto_confirm`) or stay pending.
pub struct MockNode {
    last_round: Mutex<u64>,
    responses: Mutex<VecDeque<Result<PendingTransactionInfo, NodeError>>>,
    auto_confirm: bool,
    fail_status: bool,
    polls: AtomicUsize,
    waited_rounds: Mutex<Vec<u64>>,
    submitted: Mutex<Vec<SignedTransaction>>,
    params: SuggestedParams,
}

impl MockNode {
    pub fn new(last_round: u64) -> Self {
        Self {
            last_round: Mutex::new(last_round),
            responses: Mutex::new(VecDeque::new()),
            auto_confirm: false,
            fail_status: false,
            polls: AtomicUsize::new(0),
            waited_rounds: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            params: SuggestedParams {
                fee: 0,
                min_fee: 1000,
                flat_fee: false,
                first_valid: last_round,
                last_valid: last_round + 1000,
                genesis_id: "mocknet-v1".to_string(),
                genesis_hash: [42u8; 32],
            },
        }
    }

    /// Confirm anything once the scripted responses run out
    pub fn auto_confirm(mut self) -> Self {
        self.auto_confirm = true;
        self
    }

    /// Make `status` fail
    pub fn failing_status(mut self) -> Self {
        self.fail_status = true;
        self
    }

    /// Report "still pending" for the next `n` polls
    pub fn pending_for(self, n: usize) -> Self {
        for _ in 0..n {
            self.push(Ok(PendingTransactionInfo::default()));
        }
        self
    }

    pub fn then_confirmed(self, round: u64) -> Self {
        self.push(Ok(PendingTransactionInfo {
            confirmed_round: round,
            ..Default::default()
        }));
        self
    }

    pub fn then_rejected(self, pool_error: &str) -> Self {
        self.push(Ok(PendingTransactionInfo {
            pool_error: pool_error.to_string(),
            ..Default::default()
        }));
        self
    }

    pub fn then_error(self, message: &str) -> Self {
        self.push(Err(NodeError::Rejected {
            status: 500,
            message: message.to_string(),
        }));
        self
    }

    fn push(&self, response: Result<PendingTransactionInfo, NodeError>) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response);
        }
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn waited_rounds(&self) -> Vec<u64> {
        self.waited_rounds.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Vec<SignedTransaction> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn current_round(&self) -> u64 {
        *self.last_round.lock().unwrap()
    }
}

#[async_trait]
impl NodeClient for MockNode {
    async fn status(&self) -> Result<NodeStatus, NodeError> {
        if self.fail_status {
            return Err(NodeError::Rejected {
                status: 503,
                message: "node unavailable".to_string(),
            });
        }
        Ok(NodeStatus {
            last_round: self.current_round(),
        })
    }

    async fn status_after_round(&self, round: u64) -> Result<NodeStatus, NodeError> {
        self.waited_rounds.lock().unwrap().push(round);
        let mut last = self.last_round.lock().unwrap();
        *last = (*last).max(round + 1);
        Ok(NodeStatus { last_round: *last })
    }

    async fn pending_transaction_info(
        &self,
        txid: &str,
    ) -> Result<PendingTransactionInfo, NodeError> {
        self.polls.fetch_add(1, Ordering::SeqCst);

        if let Some(response) = self.responses.lock().unwrap().pop_front() {
            return response;
        }

        let txn = self
            .submitted
            .lock()
            .unwrap()
            .iter()
            .find(|stx| stx.id().map(|id| id == txid).unwrap_or(false))
            .cloned();

        Ok(PendingTransactionInfo {
            confirmed_round: if self.auto_confirm && txn.is_some() {
                self.current_round().max(1)
            } else {
                0
            },
            pool_error: String::new(),
            txn,
        })
    }

    async fn submit_raw(&self, bytes: &[u8]) -> Result<String, NodeError> {
        let stx = SignedTransaction::decode(bytes)?;
        let id = stx.id()?;
        self.submitted.lock().unwrap().push(stx);
        Ok(id)
    }

    async fn suggested_params(&self) -> Result<SuggestedParams, NodeError> {
        Ok(self.params.clone())
    }

    async fn compile(&self, source: &str) -> Result<CompiledProgram, NodeError> {
        assemble(source).map_err(|e| NodeError::Rejected {
            status: 400,
            message: e.to_string(),
        })
    }
}
