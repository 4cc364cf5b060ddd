use std::time::Duration;

use alloy::primitives::{keccak256, B256};
use tokio::sync::Mutex;

use crate::ports::chain::{ChainError, RootRegistry};
use crate::ports::TxReceipt;

/// In-memory `RootRegistry` for batcher and server tests.
///
/// Records every confirmed root. Can be told to fail or revert the next N
/// submissions, and to take a fixed time per submission.
pub struct MockRootRegistry {
    roots: Mutex<Vec<(B256, String)>>,
    failures_left: Mutex<usize>,
    reverts_left: Mutex<usize>,
    latency: Duration,
}

impl MockRootRegistry {
    pub fn new() -> Self {
        Self {
            roots: Mutex::new(Vec::new()),
            failures_left: Mutex::new(0),
            reverts_left: Mutex::new(0),
            latency: Duration::ZERO,
        }
    }

    /// Sleep this long before each submission is recorded.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make the next `count` submissions fail with `ChainError::Rpc`.
    pub async fn fail_next(&self, count: usize) {
        *self.failures_left.lock().await = count;
    }

    /// Make the next `count` submissions mine as reverted (`success: false`).
    pub async fn revert_next(&self, count: usize) {
        *self.reverts_left.lock().await = count;
    }

    /// Roots confirmed so far, oldest first.
    pub async fn stored_roots(&self) -> Vec<B256> {
        self.roots.lock().await.iter().map(|(root, _)| *root).collect()
    }

    /// Label stored with the most recent root.
    pub async fn last_label(&self) -> Option<String> {
        self.roots.lock().await.last().map(|(_, label)| label.clone())
    }
}

impl Default for MockRootRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RootRegistry for MockRootRegistry {
    async fn set_merkle_root(&self, root: B256, label: &str) -> Result<TxReceipt, ChainError> {
        {
            let mut failures_left = self.failures_left.lock().await;
            if *failures_left > 0 {
                *failures_left -= 1;
                return Err(ChainError::Rpc("connection refused".into()));
            }
        }

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let reverted = {
            let mut reverts_left = self.reverts_left.lock().await;
            let reverted = *reverts_left > 0;
            if reverted {
                *reverts_left -= 1;
            }
            reverted
        };
        if reverted {
            return Ok(TxReceipt {
                tx_hash: keccak256(root),
                success: false,
            });
        }

        let mut roots = self.roots.lock().await;
        roots.push((root, label.to_string()));
        // Deterministic per submission so repeated roots get distinct hashes.
        let mut preimage = root.to_vec();
        preimage.extend_from_slice(&roots.len().to_be_bytes());
        Ok(TxReceipt {
            tx_hash: keccak256(preimage),
            success: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_roots_in_order() {
        let chain = MockRootRegistry::new();
        chain.set_merkle_root(B256::repeat_byte(1), "a").await.unwrap();
        chain.set_merkle_root(B256::repeat_byte(2), "b").await.unwrap();

        assert_eq!(
            chain.stored_roots().await,
            vec![B256::repeat_byte(1), B256::repeat_byte(2)]
        );
        assert_eq!(chain.last_label().await.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn fail_next_then_recover() {
        let chain = MockRootRegistry::new();
        chain.fail_next(2).await;

        assert!(chain.set_merkle_root(B256::ZERO, "x").await.is_err());
        assert!(chain.set_merkle_root(B256::ZERO, "x").await.is_err());
        assert!(chain.set_merkle_root(B256::ZERO, "x").await.is_ok());
        assert_eq!(chain.stored_roots().await.len(), 1);
    }

    #[tokio::test]
    async fn revert_next_is_not_recorded() {
        let chain = MockRootRegistry::new();
        chain.revert_next(1).await;

        let receipt = chain.set_merkle_root(B256::ZERO, "x").await.unwrap();
        assert!(!receipt.success);
        assert!(chain.stored_roots().await.is_empty());
        assert!(chain.set_merkle_root(B256::ZERO, "x").await.unwrap().success);
    }

    #[tokio::test]
    async fn same_root_gets_distinct_tx_hashes() {
        let chain = MockRootRegistry::new();
        let a = chain.set_merkle_root(B256::ZERO, "x").await.unwrap();
        let b = chain.set_merkle_root(B256::ZERO, "x").await.unwrap();
        assert_ne!(a.tx_hash, b.tx_hash);
    }
}
