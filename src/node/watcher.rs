//! Confirmation watcher
//!
//! Polls a submitted transaction once per round until it is confirmed,
//! rejected by the pool, or the round budget runs out. Every node call races
//! a cancellation token and an optional wall-clock deadline.

use crate::node::{NodeClient, NodeError, PendingTransactionInfo};
use log::{debug, info, warn};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// Watcher states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchState {
    /// Waiting on `round`
    Polling { round: u64 },
    Confirmed { round: u64 },
    Rejected,
    TimedOut,
    Failed,
    Cancelled,
}

/// Terminal states other than `Confirmed`
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("Transaction rejected by pool after {polls} polls: {pool_error}")]
    Rejected { pool_error: String, polls: usize },
    #[error("Transaction not confirmed in rounds {start_round}..{round} ({timeout} rounds)")]
    TimedOut {
        start_round: u64,
        timeout: u64,
        /// Round reached when giving up (`start_round + timeout`)
        round: u64,
        polls: usize,
    },
    #[error("Failed to query node after {polls} polls: {source}")]
    Failed {
        #[source]
        source: NodeError,
        polls: usize,
    },
    #[error("Wait cancelled after {polls} polls")]
    Cancelled { polls: usize },
}

impl WatchError {
    /// Number of pending-info polls made before stopping
    pub fn polls(&self) -> usize {
        match self {
            WatchError::InvalidArgument(_) => 0,
            WatchError::Rejected { polls, .. }
            | WatchError::TimedOut { polls, .. }
            | WatchError::Failed { polls, .. }
            | WatchError::Cancelled { polls } => *polls,
        }
    }

    pub fn state(&self) -> WatchState {
        match self {
            WatchError::Rejected { .. } => WatchState::Rejected,
            WatchError::TimedOut { .. } => WatchState::TimedOut,
            WatchError::Cancelled { .. } => WatchState::Cancelled,
            WatchError::InvalidArgument(_) | WatchError::Failed { .. } => WatchState::Failed,
        }
    }
}

/// A confirmed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOutcome {
    pub info: PendingTransactionInfo,
    /// Number of pending-info polls, including the confirming one
    pub polls: usize,
}

impl WatchOutcome {
    pub fn confirmed_round(&self) -> u64 {
        self.info.confirmed_round
    }
}

/// Waits for a transaction to be confirmed
pub struct ConfirmationWatcher<'a, N: NodeClient + ?Sized> {
    node: &'a N,
    timeout_rounds: u64,
    cancel: CancellationToken,
    deadline: Option<Duration>,
}

impl<'a, N: NodeClient + ?Sized> ConfirmationWatcher<'a, N> {
    /// Create a watcher allowing `timeout_rounds` rounds
    pub fn new(node: &'a N, timeout_rounds: u64) -> Self {
        Self {
            node,
            timeout_rounds,
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Stop waiting when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Stop waiting after `deadline` of wall-clock time
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Poll until confirmed, rejected or out of rounds
    pub async fn wait(&self, txid: &str) -> Result<WatchOutcome, WatchError> {
        if txid.is_empty() {
            return Err(WatchError::InvalidArgument("transaction id is empty"));
        }
        if self.timeout_rounds == 0 {
            return Err(WatchError::InvalidArgument(
                "timeout must be at least one round",
            ));
        }

        let deadline = self.deadline.map(|d| Instant::now() + d);
        let mut polls = 0;

        let status = self.guard(self.node.status(), deadline, polls).await?;
        // Round arithmetic saturates at u64::MAX
        let start_round = status.last_round.saturating_add(1);
        let end_round = start_round.saturating_add(self.timeout_rounds);
        let mut current = start_round;

        debug!(
            "Watching {} from round {} for {} rounds",
            txid, start_round, self.timeout_rounds
        );

        while current < end_round {
            let state = WatchState::Polling { round: current };
            debug!("{}: {:?}", txid, state);

            let info = self
                .guard(self.node.pending_transaction_info(txid), deadline, polls)
                .await?;
            polls += 1;

            if info.is_confirmed() {
                info!(
                    "✅ Transaction {} confirmed in round {} ({} polls)",
                    txid, info.confirmed_round, polls
                );
                return Ok(WatchOutcome { info, polls });
            }

            if info.is_rejected() {
                warn!("Transaction {} rejected: {}", txid, info.pool_error);
                return Err(WatchError::Rejected {
                    pool_error: info.pool_error,
                    polls,
                });
            }

            self.guard(self.node.status_after_round(current), deadline, polls)
                .await?;
            current += 1;
        }

        warn!(
            "Transaction {} not confirmed after {} rounds",
            txid, self.timeout_rounds
        );
        Err(WatchError::TimedOut {
            start_round,
            timeout: self.timeout_rounds,
            round: current,
            polls,
        })
    }

    /// Run a node call unless cancelled or past the deadline
    async fn guard<T, F>(
        &self,
        call: F,
        deadline: Option<Instant>,
        polls: usize,
    ) -> Result<T, WatchError>
    where
        F: Future<Output = Result<T, NodeError>>,
    {
        if deadline.is_some_and(|at| Instant::now() >= at) {
            warn!("Confirmation wait passed its deadline");
            return Err(WatchError::Cancelled { polls });
        }

        let expired = async {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                warn!("Confirmation wait cancelled");
                Err(WatchError::Cancelled { polls })
            }
            _ = expired => {
                warn!("Confirmation wait passed its deadline");
                Err(WatchError::Cancelled { polls })
            }
            result = call => result.map_err(|source| {
                warn!("Node query failed: {}", source);
                WatchError::Failed { source, polls }
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::mock::MockNode;

    #[tokio::test]
    async fn test_confirms_after_n_plus_one_polls() {
        let timeout = 10;
        for n in 0..timeout as usize {
            let node = MockNode::new(100).pending_for(n).then_confirmed(555);
            let outcome = ConfirmationWatcher::new(&node, timeout)
                .wait("abc123")
                .await
                .unwrap();

            assert_eq!(outcome.polls, n + 1);
            assert_eq!(node.polls(), n + 1);
            assert_eq!(outcome.confirmed_round(), 555);
        }
    }

    #[tokio::test]
    async fn test_times_out_at_start_plus_timeout() {
        let node = MockNode::new(100);
        let err = ConfirmationWatcher::new(&node, 5)
            .wait("abc123")
            .await
            .unwrap_err();

        match err {
            WatchError::TimedOut {
                start_round,
                timeout,
                round,
                polls,
            } => {
                assert_eq!(start_round, 101);
                assert_eq!(timeout, 5);
                assert_eq!(round, 106);
                assert_eq!(polls, 5);
            }
            other => panic!("expected timeout, got {:?}", other),
        }

        // One wait per round in [start, start + timeout)
        assert_eq!(node.waited_rounds(), vec![101, 102, 103, 104, 105]);
    }

    #[tokio::test]
    async fn test_huge_timeout_still_polls() {
        let node = MockNode::new(100).pending_for(1).then_confirmed(101);
        let outcome = ConfirmationWatcher::new(&node, u64::MAX)
            .wait("abc123")
            .await
            .unwrap();

        assert_eq!(outcome.polls, 2);
        assert_eq!(outcome.confirmed_round(), 101);
        assert_eq!(node.waited_rounds(), vec![101]);
    }

    #[tokio::test]
    async fn test_rejected_on_second_poll() {
        let node = MockNode::new(7)
            .pending_for(1)
            .then_rejected("overspend")
            .then_confirmed(9);

        let err = ConfirmationWatcher::new(&node, 10)
            .wait("abc123")
            .await
            .unwrap_err();

        assert!(matches!(
            &err,
            WatchError::Rejected { pool_error, polls: 2 } if pool_error == "overspend"
        ));
        assert_eq!(err.state(), WatchState::Rejected);
        assert_eq!(node.polls(), 2);
    }

    #[tokio::test]
    async fn test_fetch_error_fails() {
        let node = MockNode::new(7).pending_for(2).then_error("boom");
        let err = ConfirmationWatcher::new(&node, 10)
            .wait("abc123")
            .await
            .unwrap_err();
        assert!(matches!(err, WatchError::Failed { polls: 2, .. }));

        let node = MockNode::new(7).failing_status();
        let err = ConfirmationWatcher::new(&node, 10)
            .wait("abc123")
            .await
            .unwrap_err();
        assert!(matches!(err, WatchError::Failed { polls: 0, .. }));
        assert_eq!(node.polls(), 0);
    }

    #[tokio::test]
    async fn test_guard_rejects_bad_arguments_before_polling() {
        let node = MockNode::new(7);

        let err = ConfirmationWatcher::new(&node, 10).wait("").await.unwrap_err();
        assert!(matches!(err, WatchError::InvalidArgument(_)));

        let err = ConfirmationWatcher::new(&node, 0)
            .wait("abc123")
            .await
            .unwrap_err();
        assert!(matches!(err, WatchError::InvalidArgument(_)));

        assert_eq!(node.polls(), 0);
        assert!(node.waited_rounds().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_wait() {
        let node = MockNode::new(7);
        let token = CancellationToken::new();
        token.cancel();

        let err = ConfirmationWatcher::new(&node, 10)
            .with_cancellation(token)
            .wait("abc123")
            .await
            .unwrap_err();
        assert!(matches!(err, WatchError::Cancelled { polls: 0 }));
        assert_eq!(node.polls(), 0);
    }

    #[tokio::test]
    async fn test_expired_deadline_cancels() {
        let node = MockNode::new(7);
        let err = ConfirmationWatcher::new(&node, 10)
            .with_deadline(Duration::ZERO)
            .wait("abc123")
            .await
            .unwrap_err();
        assert_eq!(err.state(), WatchState::Cancelled);
    }
}
