use alloy::primitives::{Bytes, B256};

use super::certificate::CertificateHash;
use super::merkle::SortedKeccakTree;

/// Number of certificate hashes sealed under one Merkle root.
pub const BATCH_SIZE: usize = 8;

/// Label stored next to every root on-chain.
pub const BATCH_LABEL: &str = "Batch of 8 certificate hashes";

/// Hashes waiting for the current batch to fill up, in arrival order.
#[derive(Debug, Default, Clone)]
pub struct PendingQueue {
    hashes: Vec<CertificateHash>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hash and return the new length.
    ///
    /// Returns `None` without appending when the queue already holds a full batch.
    pub fn append(&mut self, hash: CertificateHash) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        self.hashes.push(hash);
        Some(self.hashes.len())
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.hashes.len() >= BATCH_SIZE
    }

    /// Drop every pending hash. Only called once a root is confirmed on-chain.
    pub fn reset(&mut self) {
        self.hashes.clear();
    }

    pub fn hashes(&self) -> &[CertificateHash] {
        &self.hashes
    }
}

/// Exactly [`BATCH_SIZE`] hashes in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    hashes: Vec<CertificateHash>,
}

/// Root plus one proof per leaf, in the batch's insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleResult {
    pub root: B256,
    pub proofs: Vec<Vec<Bytes>>,
}

/// What a successful seal returns to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub root: B256,
    pub proofs: Vec<Vec<Bytes>>,
    pub tx_hash: B256,
}

#[derive(Debug, thiserror::Error)]
pub enum SealError {
    #[error("merkle root is not a 32-byte word")]
    MalformedRoot,

    #[error("missing proof for leaf {0}")]
    MissingProof(usize),
}

impl Batch {
    /// Snapshot the queue as a batch. `None` unless it holds exactly `BATCH_SIZE` hashes.
    pub fn try_from_queue(queue: &PendingQueue) -> Option<Self> {
        (queue.len() == BATCH_SIZE).then(|| Self {
            hashes: queue.hashes().to_vec(),
        })
    }

    pub fn hashes(&self) -> &[CertificateHash] {
        &self.hashes
    }

    pub fn leaves(&self) -> Vec<Bytes> {
        self.hashes.iter().map(CertificateHash::leaf_bytes).collect()
    }

    /// Build the pair-sorted Keccak tree and collect the root and proofs.
    pub fn seal(&self) -> Result<MerkleResult, SealError> {
        let tree = SortedKeccakTree::new(self.leaves());
        let root = tree.root_b256().ok_or(SealError::MalformedRoot)?;
        let proofs = (0..tree.len())
            .map(|i| tree.proof(i).ok_or(SealError::MissingProof(i)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MerkleResult { root, proofs })
    }
}

/// Seal the queue if it holds a full batch. The queue itself is left untouched.
pub fn try_seal(queue: &PendingQueue) -> Option<Result<MerkleResult, SealError>> {
    Batch::try_from_queue(queue).map(|batch| batch.seal())
}
