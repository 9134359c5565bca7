//! Shared test doubles for unit and integration tests.

pub mod mocks;

pub use mocks::{MOCK_CONTRACT_ADDRESS, MockAuctionStore, MockContractClient};
