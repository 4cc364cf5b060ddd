use alloy::primitives::B256;
use std::future::Future;

use super::TxReceipt;

/// Port for the contract that stores sealed Merkle roots.
///
/// Implementations:
/// - `EthereumRootRegistry` (alloy, `RootSeal.setMerkleRoot`)
/// - `MockRootRegistry` for testing
pub trait RootRegistry: Send + Sync {
    /// Store `root` with a human-readable label and wait until the
    /// transaction is mined with the configured confirmations.
    ///
    /// A mined transaction returns `Ok` with `success` taken from the receipt
    /// status, so a revert comes back as `success: false`. Failing to send or
    /// to obtain the receipt in time is an `Err`.
    fn set_merkle_root(
        &self,
        root: B256,
        label: &str,
    ) -> impl Future<Output = Result<TxReceipt, ChainError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("transaction failed: {0}")]
    TransactionFailed(String),

    #[error("transaction {0} reverted")]
    Reverted(B256),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("no accounts available on the node")]
    NoAccounts,

    #[error("invalid chain configuration: {0}")]
    InvalidConfig(String),
}
