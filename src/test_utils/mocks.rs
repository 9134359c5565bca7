//! Mock implementations for testing.
//!
//! In-memory stand-ins for the chain client and the cache store. Both
//! record every call so tests can assert which collaborators were touched
//! and in what order, and both can be flipped into various failure modes.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    AuctionRecord, AuctionStatus, AuctionStore, ChainError, ContractClient, NftRecord, Role,
    StoreError, WhitelistAddOutcome,
};

/// Contract address all mock clients report.
pub const MOCK_CONTRACT_ADDRESS: &str = "0x00000000000000000000000000000000000000aa";

/// Mock chain client with an in-memory role registry.
///
/// # Example
///
/// ```
/// use contracts_api::test_utils::MockContractClient;
///
/// let mock = MockContractClient::new();
/// mock.grant_admin("0x1111111111111111111111111111111111111111");
/// mock.set_connected(false);
/// ```
pub struct MockContractClient {
    connected: AtomicBool,
    admins: Mutex<HashSet<String>>,
    whitelisted: Mutex<HashSet<String>>,
    role_check_error: Mutex<Option<String>>,
    write_error: Mutex<Option<String>>,
    add_always_reverts_whitelisted: AtomicBool,
    network_calls: AtomicU64,
    has_role_calls: Mutex<Vec<(Role, String)>>,
    set_price_calls: Mutex<Vec<String>>,
    add_calls: Mutex<Vec<String>>,
    remove_calls: Mutex<Vec<String>>,
}

impl MockContractClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            admins: Mutex::new(HashSet::new()),
            whitelisted: Mutex::new(HashSet::new()),
            role_check_error: Mutex::new(None),
            write_error: Mutex::new(None),
            add_always_reverts_whitelisted: AtomicBool::new(false),
            network_calls: AtomicU64::new(0),
            has_role_calls: Mutex::new(Vec::new()),
            set_price_calls: Mutex::new(Vec::new()),
            add_calls: Mutex::new(Vec::new()),
            remove_calls: Mutex::new(Vec::new()),
        }
    }

    /// Toggles the simulated provider connection.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    /// Registers `account` as a holder of the admin role.
    pub fn grant_admin(&self, account: &str) {
        self.admins.lock().unwrap().insert(account.to_string());
    }

    /// Registers `account` as whitelisted.
    pub fn grant_whitelisted(&self, account: &str) {
        self.whitelisted.lock().unwrap().insert(account.to_string());
    }

    /// Makes every role query fail with an RPC error.
    pub fn fail_role_checks(&self, message: impl Into<String>) {
        *self.role_check_error.lock().unwrap() = Some(message.into());
    }

    /// Makes every write fail with a transaction error.
    pub fn fail_writes(&self, message: impl Into<String>) {
        *self.write_error.lock().unwrap() = Some(message.into());
    }

    /// Makes the next whitelist-add report the account as already
    /// whitelisted even though the registry says otherwise. Simulates a
    /// concurrent grant landing between the status check and the write.
    pub fn force_add_already_whitelisted(&self) {
        self.add_always_reverts_whitelisted
            .store(true, Ordering::Relaxed);
    }

    pub fn network_calls(&self) -> u64 {
        self.network_calls.load(Ordering::Relaxed)
    }

    pub fn has_role_calls(&self) -> Vec<(Role, String)> {
        self.has_role_calls.lock().unwrap().clone()
    }

    pub fn set_price_calls(&self) -> Vec<String> {
        self.set_price_calls.lock().unwrap().clone()
    }

    pub fn add_calls(&self) -> Vec<String> {
        self.add_calls.lock().unwrap().clone()
    }

    pub fn remove_calls(&self) -> Vec<String> {
        self.remove_calls.lock().unwrap().clone()
    }

    fn check_write_error(&self) -> Result<(), ChainError> {
        if let Some(msg) = self.write_error.lock().unwrap().clone() {
            return Err(ChainError::Transaction(msg));
        }
        Ok(())
    }
}

impl Default for MockContractClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContractClient for MockContractClient {
    async fn network_id(&self) -> Result<u64, ChainError> {
        self.network_calls.fetch_add(1, Ordering::Relaxed);

        if !self.connected.load(Ordering::Relaxed) {
            return Err(ChainError::Rpc("connection refused".to_string()));
        }
        Ok(31337)
    }

    fn contract_address(&self) -> String {
        MOCK_CONTRACT_ADDRESS.to_string()
    }

    async fn has_role(&self, role: Role, account: &str) -> Result<bool, ChainError> {
        self.has_role_calls
            .lock()
            .unwrap()
            .push((role, account.to_string()));

        if let Some(msg) = self.role_check_error.lock().unwrap().clone() {
            return Err(ChainError::Rpc(msg));
        }

        let registry = match role {
            Role::DefaultAdmin => self.admins.lock().unwrap(),
            Role::Whitelisted => self.whitelisted.lock().unwrap(),
        };
        Ok(registry.contains(account))
    }

    async fn set_price(&self, price_eth: &str) -> Result<String, ChainError> {
        self.set_price_calls
            .lock()
            .unwrap()
            .push(price_eth.to_string());
        self.check_write_error()?;
        Ok(format!("0xmocktx{:04}", self.set_price_calls().len()))
    }

    async fn add_whitelisted(&self, account: &str) -> Result<WhitelistAddOutcome, ChainError> {
        self.add_calls.lock().unwrap().push(account.to_string());
        self.check_write_error()?;

        if self.add_always_reverts_whitelisted.load(Ordering::Relaxed) {
            return Ok(WhitelistAddOutcome::AlreadyWhitelisted);
        }

        let mut whitelisted = self.whitelisted.lock().unwrap();
        if whitelisted.insert(account.to_string()) {
            Ok(WhitelistAddOutcome::Added)
        } else {
            Ok(WhitelistAddOutcome::AlreadyWhitelisted)
        }
    }

    async fn remove_whitelisted(&self, account: &str) -> Result<(), ChainError> {
        self.remove_calls.lock().unwrap().push(account.to_string());
        self.check_write_error()?;

        self.whitelisted.lock().unwrap().remove(account);
        Ok(())
    }
}

/// Mock cache store backed by plain vectors.
pub struct MockAuctionStore {
    nfts: Mutex<Vec<NftRecord>>,
    auctions: Mutex<Vec<AuctionRecord>>,
    is_healthy: AtomicBool,
    error_message: Mutex<Option<String>>,
}

impl MockAuctionStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nfts: Mutex::new(Vec::new()),
            auctions: Mutex::new(Vec::new()),
            is_healthy: AtomicBool::new(true),
            error_message: Mutex::new(None),
        }
    }

    /// Creates a mock whose every query fails.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        let store = Self::new();
        *store.error_message.lock().unwrap() = Some(message.into());
        store
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    pub fn push_nft(&self, record: NftRecord) {
        self.nfts.lock().unwrap().push(record);
    }

    pub fn push_auction(&self, record: AuctionRecord) {
        self.auctions.lock().unwrap().push(record);
    }

    /// Builds a minimal NFT record for fixtures.
    #[must_use]
    pub fn sample_nft(id: i32, token_id: &str) -> NftRecord {
        NftRecord {
            id,
            token_id: token_id.to_string(),
            owner: MOCK_CONTRACT_ADDRESS.to_string(),
            minted_at: Utc::now(),
        }
    }

    /// Builds a minimal auction record created at `created_at` (RFC 3339).
    ///
    /// # Panics
    ///
    /// Panics if `created_at` is not a valid RFC 3339 timestamp.
    #[must_use]
    pub fn sample_auction(id: i32, created_at: &str) -> AuctionRecord {
        let created_at = DateTime::parse_from_rfc3339(created_at)
            .expect("valid RFC 3339 timestamp")
            .with_timezone(&Utc);

        AuctionRecord {
            id,
            address: MOCK_CONTRACT_ADDRESS.to_string(),
            token_id: id.to_string(),
            creator: "0x3333333333333333333333333333333333333333".to_string(),
            status: AuctionStatus::Active,
            highest_bid: "0.5".to_string(),
            highest_bidder: None,
            min_bid_increment: "0.1".to_string(),
            duration: 86400,
            started_at: Some(created_at),
            ended_at: None,
            cancelled_at: None,
            created_at,
        }
    }

    fn check_should_fail(&self) -> Result<(), StoreError> {
        if let Some(msg) = self.error_message.lock().unwrap().clone() {
            return Err(StoreError::Query(msg));
        }
        Ok(())
    }
}

impl Default for MockAuctionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuctionStore for MockAuctionStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        if !self.is_healthy.load(Ordering::Relaxed) {
            return Err(StoreError::Connection(
                "mock store unhealthy".to_string(),
            ));
        }
        self.check_should_fail()
    }

    async fn list_nfts(&self) -> Result<Vec<NftRecord>, StoreError> {
        self.check_should_fail()?;
        Ok(self.nfts.lock().unwrap().clone())
    }

    async fn list_auctions(&self) -> Result<Vec<AuctionRecord>, StoreError> {
        self.check_should_fail()?;

        let mut auctions = self.auctions.lock().unwrap().clone();
        auctions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(auctions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_client_role_registry() {
        let mock = MockContractClient::new();
        mock.grant_admin("0xadmin");

        assert!(mock.has_role(Role::DefaultAdmin, "0xadmin").await.unwrap());
        assert!(!mock.has_role(Role::DefaultAdmin, "0xother").await.unwrap());
        assert!(!mock.has_role(Role::Whitelisted, "0xadmin").await.unwrap());
        assert_eq!(mock.has_role_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_mock_client_disconnection() {
        let mock = MockContractClient::new();
        assert!(mock.network_id().await.is_ok());

        mock.set_connected(false);
        assert!(matches!(
            mock.network_id().await.unwrap_err(),
            ChainError::Rpc(_)
        ));
        assert_eq!(mock.network_calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_client_whitelist_add_is_idempotent() {
        let mock = MockContractClient::new();

        let first = mock.add_whitelisted("0xuser").await.unwrap();
        assert_eq!(first, WhitelistAddOutcome::Added);

        let second = mock.add_whitelisted("0xuser").await.unwrap();
        assert_eq!(second, WhitelistAddOutcome::AlreadyWhitelisted);
    }

    #[tokio::test]
    async fn test_mock_store_failure() {
        let mock = MockAuctionStore::failing("query failed");

        assert!(mock.list_nfts().await.is_err());
        assert!(mock.list_auctions().await.is_err());
        assert!(mock.health_check().await.is_err());
    }

    #[tokio::test]
    async fn test_mock_store_orders_auctions_newest_first() {
        let mock = MockAuctionStore::new();
        mock.push_auction(MockAuctionStore::sample_auction(1, "2024-01-01T00:00:00Z"));
        mock.push_auction(MockAuctionStore::sample_auction(2, "2024-06-01T00:00:00Z"));

        let auctions = mock.list_auctions().await.unwrap();
        assert_eq!(auctions[0].id, 2);
        assert_eq!(auctions[1].id, 1);
    }
}
