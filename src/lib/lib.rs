//! Certificate hash batching service.
//!
//! Hashes are collected in batches of eight. Each full batch is sealed into a
//! pair-sorted Keccak-256 Merkle tree whose root is stored on-chain through
//! the `RootSeal` contract; clients receive the root, one proof per hash and
//! the transaction hash.

pub mod adapters;
pub mod batcher;
pub mod config;
pub mod domain;
pub mod ports;
pub mod server;
