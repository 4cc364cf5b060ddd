use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use alloy::primitives::Address;

use crate::adapters::abi::{load_contract_abi, ArtifactError};

/// Service configuration. Every flag can also be supplied through the
/// environment (or a `.env` file loaded by the binary).
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "root-seal", about = "Certificate hash batching and Merkle root sealing service")]
pub struct ServiceConfig {
    /// JSON-RPC endpoint of the Ethereum-compatible node.
    #[arg(long, env = "RPC_URL", default_value = "http://127.0.0.1:8545")]
    pub rpc_url: String,

    /// Hex private key used to sign transactions. When absent, the first
    /// account managed by the node is used instead.
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Address of the deployed RootSeal contract.
    #[arg(long, env = "CONTRACT_ADDRESS")]
    pub contract_address: Option<String>,

    /// Hardhat artifact holding the RootSeal ABI.
    #[arg(
        long,
        env = "CONTRACT_ARTIFACT",
        default_value = "../artifacts/contracts/rootseal.sol/RootSeal.json"
    )]
    pub contract_artifact: PathBuf,

    /// HTTP port to listen on.
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Blocks to wait for before a root counts as stored.
    #[arg(long, env = "CONFIRMATIONS", default_value_t = 1)]
    pub confirmations: u64,

    /// Seconds to wait for a transaction receipt.
    #[arg(long = "receipt-timeout", env = "RECEIPT_TIMEOUT_SECS", default_value_t = 120)]
    pub receipt_timeout_secs: u64,
}

/// Errors from config loading and validation. All of them abort startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("CONTRACT_ADDRESS missing (deployed RootSeal address)")]
    MissingContractAddress,

    #[error("invalid contract address {0:?}: {1}")]
    InvalidContractAddress(String, String),

    #[error("contract artifact: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("validation error: {0}")]
    Validation(String),
}

impl ServiceConfig {
    /// Check configuration invariants and return the parsed contract address.
    ///
    /// The artifact must exist and expose `setMerkleRoot(bytes32,string)`.
    pub fn validate(&self) -> Result<Address, ConfigError> {
        let raw = self
            .contract_address
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingContractAddress)?;
        let address: Address = raw
            .parse()
            .map_err(|e| ConfigError::InvalidContractAddress(raw.to_string(), format!("{e}")))?;

        load_contract_abi(&self.contract_artifact)?;

        if self.receipt_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "receipt timeout must be at least one second".into(),
            ));
        }

        Ok(address)
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }
}
