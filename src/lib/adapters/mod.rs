pub mod abi;
pub mod ethereum;
pub mod mock_chain;
