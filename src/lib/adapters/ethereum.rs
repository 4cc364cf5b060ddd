use std::time::Duration;

use alloy::{
    network::EthereumWallet,
    primitives::{Address, B256},
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};
use tracing::{info, warn};

use super::abi::IRootSeal;
use crate::ports::{
    chain::{ChainError, RootRegistry},
    TxReceipt,
};

/// Ethereum RPC adapter for the `RootSeal` contract.
#[derive(Clone)]
pub struct EthereumRootRegistry {
    provider: DynProvider,
    contract: Address,
    /// Set when transactions are signed by the node (`eth_sendTransaction`).
    node_account: Option<Address>,
    confirmations: u64,
    receipt_timeout: Duration,
}

impl EthereumRootRegistry {
    /// Connect with a local private key.
    pub fn with_private_key(
        rpc_url: &str,
        private_key: &str,
        contract: Address,
    ) -> Result<Self, ChainError> {
        let signer: PrivateKeySigner = private_key
            .parse()
            .map_err(|e| ChainError::InvalidConfig(format!("invalid private key: {e}")))?;
        info!(address = %signer.address(), "using wallet from private key");
        let wallet = EthereumWallet::from(signer);
        let provider = DynProvider::new(
            ProviderBuilder::new()
                .wallet(wallet)
                .connect_http(
                    rpc_url
                        .parse()
                        .map_err(|e| ChainError::InvalidConfig(format!("invalid RPC URL: {e}")))?,
                ),
        );

        Ok(Self::from_parts(provider, contract, None))
    }

    /// Connect using the first account managed by the node (Hardhat / Anvil).
    pub async fn with_node_account(rpc_url: &str, contract: Address) -> Result<Self, ChainError> {
        let provider = DynProvider::new(
            ProviderBuilder::new().connect_http(
                rpc_url
                    .parse()
                    .map_err(|e| ChainError::InvalidConfig(format!("invalid RPC URL: {e}")))?,
            ),
        );
        let accounts = provider
            .get_accounts()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;
        let account = *accounts.first().ok_or(ChainError::NoAccounts)?;
        info!(address = %account, "using node-managed account");

        Ok(Self::from_parts(provider, contract, Some(account)))
    }

    fn from_parts(provider: DynProvider, contract: Address, node_account: Option<Address>) -> Self {
        Self {
            provider,
            contract,
            node_account,
            confirmations: 1,
            receipt_timeout: Duration::from_secs(120),
        }
    }

    /// Number of blocks to wait for before a submission counts as confirmed.
    pub fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations.max(1);
        self
    }

    /// Upper bound on a whole submission, from gas estimation to receipt.
    pub fn with_receipt_timeout(mut self, timeout: Duration) -> Self {
        self.receipt_timeout = timeout;
        self
    }

    pub fn contract(&self) -> Address {
        self.contract
    }
}

impl EthereumRootRegistry {
    async fn send_and_confirm(&self, root: B256, label: &str) -> Result<TxReceipt, ChainError> {
        let root_seal = IRootSeal::new(self.contract, &self.provider);

        let mut call = root_seal.setMerkleRoot(root, label.to_string());
        if let Some(account) = self.node_account {
            call = call.from(account);
        }

        let pending = call
            .send()
            .await
            .map_err(|e| ChainError::TransactionFailed(e.to_string()))?;
        let tx_hash = *pending.tx_hash();
        info!(%tx_hash, %root, "transaction sent");

        let receipt = pending
            .with_required_confirmations(self.confirmations)
            .with_timeout(Some(self.receipt_timeout))
            .get_receipt()
            .await
            .map_err(|e| ChainError::TransactionFailed(e.to_string()))?;

        Ok(TxReceipt {
            tx_hash: receipt.transaction_hash,
            success: receipt.status(),
        })
    }
}

impl RootRegistry for EthereumRootRegistry {
    async fn set_merkle_root(&self, root: B256, label: &str) -> Result<TxReceipt, ChainError> {
        // Gas estimation, nonce lookup and broadcast share the receipt deadline.
        tokio::time::timeout(self.receipt_timeout, self.send_and_confirm(root, label))
            .await
            .map_err(|_| {
                warn!(%root, timeout = ?self.receipt_timeout, "submission timed out");
                ChainError::TransactionFailed(format!(
                    "no receipt within {:?}",
                    self.receipt_timeout
                ))
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    // Anvil / Hardhat default account #0.
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_invalid_private_key() {
        let result =
            EthereumRootRegistry::with_private_key("http://127.0.0.1:8545", "not-a-key", Address::ZERO);
        assert!(matches!(result, Err(ChainError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_rpc_url() {
        let result = EthereumRootRegistry::with_private_key("not a url", DEV_KEY, Address::ZERO);
        assert!(matches!(result, Err(ChainError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_node_account_invalid_rpc_url() {
        let result = EthereumRootRegistry::with_node_account("not a url", Address::ZERO).await;
        assert!(matches!(result, Err(ChainError::InvalidConfig(_))));
    }

    #[test]
    fn test_confirmations_at_least_one() {
        let registry =
            EthereumRootRegistry::with_private_key("http://127.0.0.1:8545", DEV_KEY, Address::ZERO)
                .unwrap()
                .with_confirmations(0);
        assert_eq!(registry.confirmations, 1);
        assert_eq!(registry.with_confirmations(3).confirmations, 3);
    }

    #[tokio::test]
    async fn test_unresponsive_node_times_out() {
        // Accepts connections and never answers.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let registry =
            EthereumRootRegistry::with_private_key(&format!("http://{addr}"), DEV_KEY, Address::ZERO)
                .unwrap()
                .with_receipt_timeout(Duration::from_millis(500));

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            registry.set_merkle_root(B256::ZERO, "Batch of 8 certificate hashes"),
        )
        .await
        .expect("submission should give up on its own");
        assert!(matches!(result, Err(ChainError::TransactionFailed(_))));
    }
}
