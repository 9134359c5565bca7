//! Chain client implementations.

pub mod ethereum;

pub use ethereum::EthereumContractClient;
