//! Collaborator seams consumed by the orchestration layer.
//!
//! Production adapters live under `infra`; mocks live in `test_utils`.

use async_trait::async_trait;

use super::error::{ChainError, StoreError};
use super::types::{AuctionRecord, NftRecord, Role, WhitelistAddOutcome};

/// Gateway to the NFT contract and its JSON-RPC provider.
#[async_trait]
pub trait ContractClient: Send + Sync {
    /// Liveness probe. Returns the provider's network id, or a transport
    /// error when the node is unreachable.
    async fn network_id(&self) -> Result<u64, ChainError>;

    /// The deployed contract address, used for log and error attribution.
    fn contract_address(&self) -> String;

    /// Checks whether `account` holds `role` on the contract.
    async fn has_role(&self, role: Role, account: &str) -> Result<bool, ChainError>;

    /// Submits a price update and waits for inclusion. Returns the
    /// transaction hash. `price_eth` is a decimal string in whole-token
    /// units; the adapter converts to the 18-decimal base unit.
    async fn set_price(&self, price_eth: &str) -> Result<String, ChainError>;

    /// Grants the whitelist role to `account`. A revert indicating the
    /// account already holds the role is decoded here, so callers see a
    /// typed outcome instead of a reason string.
    async fn add_whitelisted(&self, account: &str) -> Result<WhitelistAddOutcome, ChainError>;

    /// Revokes the whitelist role from `account`.
    async fn remove_whitelisted(&self, account: &str) -> Result<(), ChainError>;
}

/// Read-only view over the event-listener-maintained cache tables.
#[async_trait]
pub trait AuctionStore: Send + Sync {
    /// Cheap connectivity probe for readiness checks.
    async fn health_check(&self) -> Result<(), StoreError>;

    /// All cached NFT records.
    async fn list_nfts(&self) -> Result<Vec<NftRecord>, StoreError>;

    /// All cached auction records, newest first by creation time.
    async fn list_auctions(&self) -> Result<Vec<AuctionRecord>, StoreError>;
}
