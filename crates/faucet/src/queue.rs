//! Ordered claim submission queue
//!
//! Every claim is signed by the same faucet account, so two submissions in
//! flight at once can be handed the same nonce. The queue serializes them:
//! slot `n` runs its submission only after slot `n - 1` has failed, or has
//! succeeded and its transaction has been confirmed (or the confirmation wait
//! failed). A failure only ever reaches the slot that produced it.
//!
//! Only the tail of the chain is retained. Each slot holds the receiver that
//! its predecessor signals once settled, and hands its own sender to the task
//! that runs it. The queue is unbounded.

use crate::contract::TransactionHandle;
use crate::error::NetworkError;
use crate::metrics::QUEUE_PENDING;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Result delivered to the caller of `enqueue`
pub type ClaimOutcome = Result<SubmittedClaim, SlotError>;

/// Why a queue slot did not produce a submitted claim
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    /// The action or its network call failed
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The slot's task went away without reporting, e.g. the action panicked
    #[error("claim #{0} was aborted before completing")]
    Aborted(u64),
}

/// A claim that the network accepted for inclusion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedClaim {
    pub position: u64,
    pub transaction_id: String,
}

struct QueueTail {
    next_position: u64,
    /// Fires (or is dropped) once the most recent slot has settled
    last_settled: Option<oneshot::Receiver<()>>,
}

/// FIFO of pending claim submissions
pub struct ClaimQueue {
    tail: Mutex<QueueTail>,
    pending: Arc<AtomicUsize>,
}

impl Default for ClaimQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimQueue {
    pub fn new() -> Self {
        Self {
            tail: Mutex::new(QueueTail {
                next_position: 0,
                last_settled: None,
            }),
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Enqueue an unlabeled submission. See [`ClaimQueue::enqueue_named`].
    pub fn enqueue<F, Fut>(&self, action: F) -> ClaimTicket
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<TransactionHandle, NetworkError>> + Send + 'static,
    {
        self.enqueue_named("claim", action)
    }

    /// Assign the next position to `action` and schedule it behind the current tail.
    ///
    /// Returns immediately; `action` is never invoked synchronously. Must be
    /// called from within a Tokio runtime.
    pub fn enqueue_named<F, Fut>(&self, label: impl Into<String>, action: F) -> ClaimTicket
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<TransactionHandle, NetworkError>> + Send + 'static,
    {
        let label = label.into();
        let (settled_tx, settled_rx) = oneshot::channel::<()>();
        let (outcome_tx, outcome_rx) = oneshot::channel::<ClaimOutcome>();

        // Position and predecessor are taken together so that position order
        // is chain order.
        let (position, predecessor) = {
            let mut tail = self.tail.lock().unwrap_or_else(PoisonError::into_inner);
            let position = tail.next_position;
            tail.next_position += 1;
            (position, tail.last_settled.replace(settled_rx))
        };

        let guard = PendingGuard::new(self.pending.clone());
        info!("[QUEUED] [#{}] {}", position, label);

        tokio::spawn(async move {
            let _guard = guard;

            if let Some(predecessor) = predecessor {
                // Err means the predecessor's task was torn down; either way it has settled.
                let _ = predecessor.await;
            }

            info!("[STARTED] [#{}] {}", position, label);

            match action().await {
                Ok(handle) => {
                    let (transaction_id, confirmation) = handle.into_parts();
                    let has_id = !transaction_id.is_empty();
                    let _ = outcome_tx.send(Ok(SubmittedClaim {
                        position,
                        transaction_id: transaction_id.clone(),
                    }));

                    // Nothing to wait for without an id
                    if has_id {
                        if let Err(e) = confirmation.await {
                            warn!("[#{}] confirmation of {} failed: {}", position, transaction_id, e);
                        }
                    }
                }
                Err(e) => {
                    warn!("[#{}] {} failed: {}", position, label, e);
                    let _ = outcome_tx.send(Err(SlotError::Network(e)));
                }
            }

            info!("[FINISHED] [#{}] {}", position, label);
            let _ = settled_tx.send(());
        });

        ClaimTicket {
            position,
            outcome: outcome_rx,
        }
    }

    /// Slots enqueued but not yet settled
    pub fn len(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position the next `enqueue` will receive
    pub fn next_position(&self) -> u64 {
        self.tail
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_position
    }
}

/// Tracks one unsettled slot, including slots whose task panicked
struct PendingGuard(Arc<AtomicUsize>);

impl PendingGuard {
    fn new(pending: Arc<AtomicUsize>) -> Self {
        pending.fetch_add(1, Ordering::SeqCst);
        QUEUE_PENDING.inc();
        Self(pending)
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
        QUEUE_PENDING.dec();
    }
}

/// Future result of one queued claim.
///
/// Resolves when the claim's transaction has been submitted (not when it is
/// confirmed). Dropping the ticket does not cancel the claim.
pub struct ClaimTicket {
    position: u64,
    outcome: oneshot::Receiver<ClaimOutcome>,
}

impl ClaimTicket {
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl Future for ClaimTicket {
    type Output = ClaimOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let position = self.position;
        Pin::new(&mut self.outcome)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(SlotError::Aborted(position))))
    }
}
