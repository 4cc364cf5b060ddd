use std::path::Path;

use alloy::json_abi::JsonAbi;
use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IRootSeal {
        function setMerkleRoot(bytes32 root, string description) external;
    }
}

/// Canonical signature the deployed contract must expose.
pub const SET_MERKLE_ROOT_SIGNATURE: &str = "setMerkleRoot(bytes32,string)";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("contract artifact not found at {0}")]
    NotFound(String),

    #[error("failed to read contract artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse contract artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("contract artifact has no `abi` field")]
    MissingAbi,

    #[error("contract ABI does not expose setMerkleRoot(bytes32,string)")]
    MissingFunction,
}

/// Load the ABI from a Hardhat-style artifact (`{ "abi": [...], ... }`) and
/// check that it matches the binding used to submit roots.
pub fn load_contract_abi(path: &Path) -> Result<JsonAbi, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::NotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    let mut artifact: serde_json::Value = serde_json::from_str(&content)?;
    let abi_value = artifact
        .get_mut("abi")
        .map(serde_json::Value::take)
        .ok_or(ArtifactError::MissingAbi)?;
    let abi: JsonAbi = serde_json::from_value(abi_value)?;

    let exposes_setter = abi
        .function("setMerkleRoot")
        .is_some_and(|overloads| {
            overloads
                .iter()
                .any(|f| f.signature() == SET_MERKLE_ROOT_SIGNATURE)
        });
    if !exposes_setter {
        return Err(ArtifactError::MissingFunction);
    }

    Ok(abi)
}
