use std::sync::Arc;

use alloy::primitives::B256;
use tokio::sync::{watch, Mutex, OwnedMutexGuard};
use tracing::{error, info, warn};

use crate::domain::batch::{
    try_seal, PendingQueue, SealError, SubmissionReceipt, BATCH_LABEL, BATCH_SIZE,
};
use crate::domain::certificate::{CertificateHash, ValidationError};
use crate::ports::chain::{ChainError, RootRegistry};

/// Error type for batcher operations.
#[derive(Debug, thiserror::Error)]
pub enum BatcherError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("batch already full ({count} pending), retry the pending submission")]
    BatchFull { count: usize },

    #[error("no full batch pending ({count} pending)")]
    NothingToRetry { count: usize },

    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("seal error: {0}")]
    Seal(#[from] SealError),

    #[error("submission task failed: {0}")]
    SubmissionTask(String),
}

/// Result of adding one certificate hash.
#[derive(Debug)]
pub enum AddOutcome {
    /// Hash queued; the batch is not full yet.
    Queued { count: usize },
    /// Hash completed a batch whose root is now confirmed on-chain.
    Sealed(SubmissionReceipt),
}

/// Snapshot of the batcher for the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchStatus {
    pub pending: usize,
    pub batch_size: usize,
    pub sealed_batches: usize,
    pub last_root: Option<B256>,
}

struct BatcherState {
    queue: PendingQueue,
    /// Roots confirmed on-chain, oldest first.
    sealed_roots: Vec<B256>,
    status: watch::Sender<BatchStatus>,
}

impl BatcherState {
    /// Publish the current counts. Called after every mutation.
    fn publish(&self) {
        self.status.send_replace(BatchStatus {
            pending: self.queue.len(),
            batch_size: BATCH_SIZE,
            sealed_batches: self.sealed_roots.len(),
            last_root: self.sealed_roots.last().copied(),
        });
    }
}

/// Collects certificate hashes and seals every full batch on-chain.
///
/// All mutation goes through one lock that is held across append, seal,
/// submission and reset, so concurrent requests cannot overfill the queue or
/// seal the same batch twice. Sealing and submission run on their own task
/// that owns the lock, so a dropped request cannot leave a sent transaction
/// half-recorded. The queue is reset only after the registry confirms the
/// root; on failure the full batch is kept for a retry.
///
/// Status reads go through a `watch` snapshot and never wait for the lock.
pub struct CertificateBatcher<R: RootRegistry> {
    registry: Arc<R>,
    state: Arc<Mutex<BatcherState>>,
    status: watch::Receiver<BatchStatus>,
}

impl<R: RootRegistry + 'static> CertificateBatcher<R> {
    pub fn new(registry: R) -> Self {
        let (status_tx, status) = watch::channel(BatchStatus {
            pending: 0,
            batch_size: BATCH_SIZE,
            sealed_batches: 0,
            last_root: None,
        });
        Self {
            registry: Arc::new(registry),
            state: Arc::new(Mutex::new(BatcherState {
                queue: PendingQueue::new(),
                sealed_roots: Vec::new(),
                status: status_tx,
            })),
            status,
        }
    }

    /// Validate and append a hash; seal and submit when it completes a batch.
    ///
    /// - Fewer than `BATCH_SIZE` pending after the append: `Queued`.
    /// - Exactly `BATCH_SIZE`: the batch is sealed and submitted. Returns
    ///   `Sealed` and empties the queue once confirmed, or `Chain` with the
    ///   batch retained.
    /// - A retained full batch is already waiting: `BatchFull`, nothing appended.
    pub async fn add_certificate_hash(
        &self,
        raw: Option<&str>,
    ) -> Result<AddOutcome, BatcherError> {
        let hash = CertificateHash::parse(raw)?;

        let mut state = Arc::clone(&self.state).lock_owned().await;
        let count = state
            .queue
            .append(hash.clone())
            .ok_or(BatcherError::BatchFull {
                count: state.queue.len(),
            })?;
        state.publish();
        info!(count, batch_size = BATCH_SIZE, certificate_hash = %hash, "added certificate hash");

        if count < BATCH_SIZE {
            return Ok(AddOutcome::Queued { count });
        }

        let receipt = self.submit_detached(state).await?;
        Ok(AddOutcome::Sealed(receipt))
    }

    /// Re-submit a batch retained after a failed submission.
    pub async fn retry_submission(&self) -> Result<SubmissionReceipt, BatcherError> {
        let state = Arc::clone(&self.state).lock_owned().await;
        if !state.queue.is_full() {
            return Err(BatcherError::NothingToRetry {
                count: state.queue.len(),
            });
        }
        info!("retrying retained batch");
        self.submit_detached(state).await
    }

    pub async fn pending_count(&self) -> usize {
        self.status.borrow().pending
    }

    pub async fn status(&self) -> BatchStatus {
        self.status.borrow().clone()
    }

    /// Seal and submit on a spawned task that keeps the lock until the
    /// registry answers. Dropping the returned future does not cancel it.
    async fn submit_detached(
        &self,
        mut state: OwnedMutexGuard<BatcherState>,
    ) -> Result<SubmissionReceipt, BatcherError> {
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move { seal_and_submit(registry.as_ref(), &mut state).await })
            .await
            .map_err(|e| BatcherError::SubmissionTask(e.to_string()))?
    }
}

async fn seal_and_submit<R: RootRegistry>(
    registry: &R,
    state: &mut BatcherState,
) -> Result<SubmissionReceipt, BatcherError> {
    info!("building merkle tree");
    let sealed = match try_seal(&state.queue) {
        Some(sealed) => sealed?,
        None => {
            return Err(BatcherError::NothingToRetry {
                count: state.queue.len(),
            })
        }
    };
    info!(root = %sealed.root, "merkle root computed");

    let tx_receipt = match registry.set_merkle_root(sealed.root, BATCH_LABEL).await {
        Ok(tx_receipt) => tx_receipt,
        Err(e) => {
            error!(error = %e, root = %sealed.root, "failed to store root, batch retained");
            return Err(e.into());
        }
    };
    if !tx_receipt.success {
        warn!(tx_hash = %tx_receipt.tx_hash, root = %sealed.root, "setMerkleRoot reverted, batch retained");
        return Err(ChainError::Reverted(tx_receipt.tx_hash).into());
    }
    info!(tx_hash = %tx_receipt.tx_hash, root = %sealed.root, "root stored on chain");

    state.queue.reset();
    state.sealed_roots.push(sealed.root);
    state.publish();

    Ok(SubmissionReceipt {
        root: sealed.root,
        proofs: sealed.proofs,
        tx_hash: tx_receipt.tx_hash,
    })
}
