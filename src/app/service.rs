//! Orchestration of privileged contract writes and cached reads.
//!
//! Every write walks the same guard chain: input validation, a provider
//! liveness probe, a single-shot admin role check, then the chain call
//! under the bounded retry executor. Reads run only the probe before
//! hitting the cache store.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::app::retry::RetryPolicy;
use crate::domain::{
    ApiError, AuctionRecord, AuctionStore, ContractClient, HealthResponse, HealthStatus, NftRecord,
    OperationOutcome, Role, UpdatePriceRequest, WhitelistAddOutcome, WhitelistRequest, messages,
    ops, validate_address, validate_price,
};

/// Core service orchestrating the chain client and the cache store.
///
/// Holds trait objects for both collaborators, so tests can swap in the
/// mocks from `test_utils` without touching any transport code.
pub struct ContractService {
    chain: Arc<dyn ContractClient>,
    store: Arc<dyn AuctionStore>,
    retry: RetryPolicy,
}

impl ContractService {
    #[must_use]
    pub fn new(chain: Arc<dyn ContractClient>, store: Arc<dyn AuctionStore>) -> Self {
        Self {
            chain,
            store,
            retry: RetryPolicy::default(),
        }
    }

    /// Overrides the default retry policy. Used by tests to collapse the
    /// backoff delays.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Updates the contract's sale price.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a malformed caller address or price,
    /// `Connection` when the provider probe fails, `Unauthorized` when the
    /// caller lacks the admin role, and `RetryExhausted` when the write
    /// keeps failing.
    #[instrument(skip(self, request), fields(caller = %request.caller_address))]
    pub async fn update_price(
        &self,
        request: &UpdatePriceRequest,
    ) -> Result<OperationOutcome, ApiError> {
        validate_address(&request.caller_address)?;
        validate_price(&request.new_price)?;

        self.ensure_connected().await?;
        self.assert_admin_role(&request.caller_address).await?;

        let contract_address = self.chain.contract_address();
        let tx_hash = self
            .retry
            .execute(
                async || self.chain.set_price(&request.new_price).await,
                ops::SET_PRICES,
                &contract_address,
            )
            .await?;

        info!(%tx_hash, %contract_address, "price updated");
        Ok(OperationOutcome::Completed {
            message: messages::PRICE_UPDATED,
        })
    }

    /// Grants the whitelist role to `request.address`.
    ///
    /// Already-whitelisted addresses short-circuit to a benign outcome
    /// without submitting a transaction. A concurrent grant that lands
    /// between the status check and the write is reported the same way.
    #[instrument(skip(self, request), fields(caller = %request.caller_address, address = %request.address))]
    pub async fn add_to_whitelist(
        &self,
        request: &WhitelistRequest,
    ) -> Result<OperationOutcome, ApiError> {
        validate_address(&request.caller_address)?;
        validate_address(&request.address)?;

        self.ensure_connected().await?;
        self.assert_admin_role(&request.caller_address).await?;

        if self
            .whitelist_status(&request.address)
            .await?
        {
            info!(address = %request.address, "address already whitelisted, skipping write");
            return Ok(OperationOutcome::AlreadyWhitelisted);
        }

        let contract_address = self.chain.contract_address();
        let outcome = self
            .retry
            .execute(
                async || self.chain.add_whitelisted(&request.address).await,
                ops::ADD_WHITELIST_ADDRESS,
                &contract_address,
            )
            .await?;

        match outcome {
            WhitelistAddOutcome::Added => {
                info!(address = %request.address, "address whitelisted");
                Ok(OperationOutcome::Completed {
                    message: messages::WHITELIST_ADDED,
                })
            }
            WhitelistAddOutcome::AlreadyWhitelisted => {
                // Another writer won the race between our status check and
                // the transaction. The chain state matches the request, so
                // this is not a failure.
                warn!(address = %request.address, "concurrent whitelist grant detected");
                Ok(OperationOutcome::AlreadyWhitelisted)
            }
        }
    }

    /// Revokes the whitelist role from `request.address`.
    ///
    /// A missing or malformed target address and an address that is not
    /// whitelisted are both benign outcomes, not errors. The missing-target
    /// case returns before any network traffic.
    #[instrument(skip(self, request), fields(caller = %request.caller_address))]
    pub async fn remove_from_whitelist(
        &self,
        request: &WhitelistRequest,
    ) -> Result<OperationOutcome, ApiError> {
        // A missing or malformed target is a benign no-op here, unlike the
        // add path. Returns before any network traffic.
        if validate_address(&request.address).is_err() {
            return Ok(OperationOutcome::NoAddress);
        }

        validate_address(&request.caller_address)?;

        self.ensure_connected().await?;
        self.assert_admin_role(&request.caller_address).await?;

        if !self
            .whitelist_status(&request.address)
            .await?
        {
            info!(address = %request.address, "address not whitelisted, skipping write");
            return Ok(OperationOutcome::NotWhitelisted);
        }

        let contract_address = self.chain.contract_address();
        self.retry
            .execute(
                async || self.chain.remove_whitelisted(&request.address).await,
                ops::REMOVE_WHITELIST_ADDRESS,
                &contract_address,
            )
            .await?;

        info!(address = %request.address, "address removed from whitelist");
        Ok(OperationOutcome::Completed {
            message: messages::WHITELIST_REMOVED,
        })
    }

    /// Lists all cached NFT records. Read paths still run the liveness
    /// probe, but any failure here is a persistence-class error since no
    /// retry semantics apply.
    #[instrument(skip(self))]
    pub async fn fetch_available_nfts(&self) -> Result<Vec<NftRecord>, ApiError> {
        self.chain
            .network_id()
            .await
            .map_err(|e| ApiError::Persistence {
                operation: ops::GET_AVAILABLE_NFTS,
                cause: e.to_string(),
            })?;

        self.store
            .list_nfts()
            .await
            .map_err(|e| ApiError::Persistence {
                operation: ops::GET_AVAILABLE_NFTS,
                cause: e.to_string(),
            })
    }

    /// Lists all cached auction records, newest first.
    #[instrument(skip(self))]
    pub async fn fetch_ongoing_auctions(&self) -> Result<Vec<AuctionRecord>, ApiError> {
        self.chain
            .network_id()
            .await
            .map_err(|e| ApiError::Persistence {
                operation: ops::GET_ONGOING_AUCTIONS,
                cause: e.to_string(),
            })?;

        self.store
            .list_auctions()
            .await
            .map_err(|e| ApiError::Persistence {
                operation: ops::GET_ONGOING_AUCTIONS,
                cause: e.to_string(),
            })
    }

    /// Probes both collaborators for the health endpoint.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> HealthResponse {
        let database = match self.store.health_check().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => {
                warn!(error = %e, "database health check failed");
                HealthStatus::Unhealthy
            }
        };

        let blockchain = match self.chain.network_id().await {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => {
                warn!(error = %e, "provider health check failed");
                HealthStatus::Unhealthy
            }
        };

        HealthResponse::new(database, blockchain)
    }

    /// Provider liveness probe. Write operations refuse to touch the
    /// contract when the node is unreachable; the probe itself is not
    /// retried.
    async fn ensure_connected(&self) -> Result<(), ApiError> {
        self.chain
            .network_id()
            .await
            .map(|_| ())
            .map_err(|e| ApiError::Connection(e.to_string()))
    }

    /// Single-shot admin role check. A definitive `false` fails closed as
    /// `Unauthorized`; a query failure is attributed to the role
    /// verification step and is not retried.
    async fn assert_admin_role(&self, caller: &str) -> Result<(), ApiError> {
        let holds_role = self
            .chain
            .has_role(Role::DefaultAdmin, caller)
            .await
            .map_err(|cause| ApiError::Operation {
                operation: ops::VERIFY_ROLE,
                contract_address: self.chain.contract_address(),
                cause,
            })?;

        if holds_role {
            Ok(())
        } else {
            warn!(caller, "admin role check failed");
            Err(ApiError::Unauthorized)
        }
    }

    /// Whitelist membership query. Unlike the authorization check this is
    /// a plain chain read, so it runs under the retry executor.
    async fn whitelist_status(&self, address: &str) -> Result<bool, ApiError> {
        let contract_address = self.chain.contract_address();
        self.retry
            .execute(
                async || self.chain.has_role(Role::Whitelisted, address).await,
                ops::VERIFY_WHITELIST_STATUS,
                &contract_address,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::ChainError;
    use crate::test_utils::{MockAuctionStore, MockContractClient};

    const ADMIN: &str = "0x1111111111111111111111111111111111111111";
    const TARGET: &str = "0x2222222222222222222222222222222222222222";

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::ZERO,
        }
    }

    fn service_with(
        chain: Arc<MockContractClient>,
        store: Arc<MockAuctionStore>,
    ) -> ContractService {
        ContractService::new(chain, store).with_retry_policy(fast_retry())
    }

    fn price_request(caller: &str, price: &str) -> UpdatePriceRequest {
        UpdatePriceRequest {
            caller_address: caller.to_string(),
            new_price: price.to_string(),
        }
    }

    fn whitelist_request(caller: &str, address: &str) -> WhitelistRequest {
        WhitelistRequest {
            caller_address: caller.to_string(),
            address: address.to_string(),
        }
    }

    #[tokio::test]
    async fn test_update_price_success() {
        let chain = Arc::new(MockContractClient::new());
        chain.grant_admin(ADMIN);
        let store = Arc::new(MockAuctionStore::new());
        let service = service_with(chain.clone(), store);

        let outcome = service
            .update_price(&price_request(ADMIN, "1.5"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            OperationOutcome::Completed {
                message: messages::PRICE_UPDATED
            }
        );
        assert_eq!(chain.set_price_calls(), vec!["1.5".to_string()]);
    }

    #[tokio::test]
    async fn test_update_price_invalid_caller_fails_before_network() {
        let chain = Arc::new(MockContractClient::new());
        let service = service_with(chain.clone(), Arc::new(MockAuctionStore::new()));

        let result = service.update_price(&price_request("not-an-address", "1.5")).await;

        assert!(matches!(result.unwrap_err(), ApiError::InvalidInput(_)));
        assert_eq!(chain.network_calls(), 0);
        assert!(chain.set_price_calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_price_invalid_price_fails_before_network() {
        let chain = Arc::new(MockContractClient::new());
        let service = service_with(chain.clone(), Arc::new(MockAuctionStore::new()));

        let result = service.update_price(&price_request(ADMIN, "-1")).await;

        assert!(matches!(result.unwrap_err(), ApiError::InvalidInput(_)));
        assert_eq!(chain.network_calls(), 0);
    }

    #[tokio::test]
    async fn test_update_price_connection_down() {
        let chain = Arc::new(MockContractClient::new());
        chain.grant_admin(ADMIN);
        chain.set_connected(false);
        let service = service_with(chain.clone(), Arc::new(MockAuctionStore::new()));

        let result = service.update_price(&price_request(ADMIN, "1.5")).await;

        assert!(matches!(result.unwrap_err(), ApiError::Connection(_)));
        // Authorization is never consulted when the provider is down.
        assert!(chain.has_role_calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_price_unauthorized_caller() {
        let chain = Arc::new(MockContractClient::new());
        let service = service_with(chain.clone(), Arc::new(MockAuctionStore::new()));

        let result = service.update_price(&price_request(ADMIN, "1.5")).await;

        assert!(matches!(result.unwrap_err(), ApiError::Unauthorized));
        assert!(chain.set_price_calls().is_empty());
        // The role check ran exactly once; it is never retried.
        assert_eq!(chain.has_role_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_update_price_role_check_failure_not_retried() {
        let chain = Arc::new(MockContractClient::new());
        chain.fail_role_checks("eth_call failed");
        let service = service_with(chain.clone(), Arc::new(MockAuctionStore::new()));

        let result = service.update_price(&price_request(ADMIN, "1.5")).await;

        match result.unwrap_err() {
            ApiError::Operation { operation, cause, .. } => {
                assert_eq!(operation, ops::VERIFY_ROLE);
                assert!(matches!(cause, ChainError::Rpc(_)));
            }
            other => panic!("expected Operation, got {other:?}"),
        }
        assert_eq!(chain.has_role_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_update_price_retries_then_exhausts() {
        let chain = Arc::new(MockContractClient::new());
        chain.grant_admin(ADMIN);
        chain.fail_writes("nonce too low");
        let service = service_with(chain.clone(), Arc::new(MockAuctionStore::new()));

        let result = service.update_price(&price_request(ADMIN, "1.5")).await;

        match result.unwrap_err() {
            ApiError::RetryExhausted { attempts, operation, .. } => {
                assert_eq!(attempts, 3);
                assert_eq!(operation, ops::SET_PRICES);
            }
            other => panic!("expected RetryExhausted, got {other:?}"),
        }
        assert_eq!(chain.set_price_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_add_to_whitelist_success() {
        let chain = Arc::new(MockContractClient::new());
        chain.grant_admin(ADMIN);
        let service = service_with(chain.clone(), Arc::new(MockAuctionStore::new()));

        let outcome = service
            .add_to_whitelist(&whitelist_request(ADMIN, TARGET))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            OperationOutcome::Completed {
                message: messages::WHITELIST_ADDED
            }
        );
        assert_eq!(chain.add_calls(), vec![TARGET.to_string()]);
    }

    #[tokio::test]
    async fn test_add_to_whitelist_already_whitelisted_skips_write() {
        let chain = Arc::new(MockContractClient::new());
        chain.grant_admin(ADMIN);
        chain.grant_whitelisted(TARGET);
        let service = service_with(chain.clone(), Arc::new(MockAuctionStore::new()));

        let outcome = service
            .add_to_whitelist(&whitelist_request(ADMIN, TARGET))
            .await
            .unwrap();

        assert_eq!(outcome, OperationOutcome::AlreadyWhitelisted);
        assert!(chain.add_calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_to_whitelist_concurrent_grant_downgrades() {
        let chain = Arc::new(MockContractClient::new());
        chain.grant_admin(ADMIN);
        // Status check says absent, but the write reverts as already
        // whitelisted: another writer landed first.
        chain.force_add_already_whitelisted();
        let service = service_with(chain.clone(), Arc::new(MockAuctionStore::new()));

        let outcome = service
            .add_to_whitelist(&whitelist_request(ADMIN, TARGET))
            .await
            .unwrap();

        assert_eq!(outcome, OperationOutcome::AlreadyWhitelisted);
        assert_eq!(chain.add_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_add_to_whitelist_invalid_target() {
        let chain = Arc::new(MockContractClient::new());
        chain.grant_admin(ADMIN);
        let service = service_with(chain.clone(), Arc::new(MockAuctionStore::new()));

        let result = service
            .add_to_whitelist(&whitelist_request(ADMIN, "0x1234"))
            .await;

        assert!(matches!(result.unwrap_err(), ApiError::InvalidInput(_)));
        assert_eq!(chain.network_calls(), 0);
    }

    #[tokio::test]
    async fn test_remove_from_whitelist_success() {
        let chain = Arc::new(MockContractClient::new());
        chain.grant_admin(ADMIN);
        chain.grant_whitelisted(TARGET);
        let service = service_with(chain.clone(), Arc::new(MockAuctionStore::new()));

        let outcome = service
            .remove_from_whitelist(&whitelist_request(ADMIN, TARGET))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            OperationOutcome::Completed {
                message: messages::WHITELIST_REMOVED
            }
        );
        assert_eq!(chain.remove_calls(), vec![TARGET.to_string()]);
    }

    #[tokio::test]
    async fn test_remove_from_whitelist_blank_address_is_benign_and_offline() {
        let chain = Arc::new(MockContractClient::new());
        // Even a dead provider does not matter for the blank-address case.
        chain.set_connected(false);
        let service = service_with(chain.clone(), Arc::new(MockAuctionStore::new()));

        let outcome = service
            .remove_from_whitelist(&whitelist_request(ADMIN, "   "))
            .await
            .unwrap();

        assert_eq!(outcome, OperationOutcome::NoAddress);
        assert_eq!(chain.network_calls(), 0);
        assert!(chain.has_role_calls().is_empty());
    }

    #[tokio::test]
    async fn test_remove_from_whitelist_malformed_address_is_benign() {
        let chain = Arc::new(MockContractClient::new());
        chain.grant_admin(ADMIN);
        let service = service_with(chain.clone(), Arc::new(MockAuctionStore::new()));

        let outcome = service
            .remove_from_whitelist(&whitelist_request(ADMIN, "0x1234"))
            .await
            .unwrap();

        assert_eq!(outcome, OperationOutcome::NoAddress);
        assert_eq!(chain.network_calls(), 0);
        assert!(chain.remove_calls().is_empty());
    }

    #[tokio::test]
    async fn test_remove_from_whitelist_not_whitelisted_skips_write() {
        let chain = Arc::new(MockContractClient::new());
        chain.grant_admin(ADMIN);
        let service = service_with(chain.clone(), Arc::new(MockAuctionStore::new()));

        let outcome = service
            .remove_from_whitelist(&whitelist_request(ADMIN, TARGET))
            .await
            .unwrap();

        assert_eq!(outcome, OperationOutcome::NotWhitelisted);
        assert!(chain.remove_calls().is_empty());
    }

    #[tokio::test]
    async fn test_remove_from_whitelist_unauthorized() {
        let chain = Arc::new(MockContractClient::new());
        chain.grant_whitelisted(TARGET);
        let service = service_with(chain.clone(), Arc::new(MockAuctionStore::new()));

        let result = service
            .remove_from_whitelist(&whitelist_request(ADMIN, TARGET))
            .await;

        assert!(matches!(result.unwrap_err(), ApiError::Unauthorized));
        assert!(chain.remove_calls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_available_nfts_empty_is_ok() {
        let service = service_with(
            Arc::new(MockContractClient::new()),
            Arc::new(MockAuctionStore::new()),
        );

        let nfts = service.fetch_available_nfts().await.unwrap();
        assert!(nfts.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_available_nfts_store_failure_maps_to_persistence() {
        let store = Arc::new(MockAuctionStore::failing("pool exhausted"));
        let service = service_with(Arc::new(MockContractClient::new()), store);

        let result = service.fetch_available_nfts().await;

        match result.unwrap_err() {
            ApiError::Persistence { operation, cause } => {
                assert_eq!(operation, ops::GET_AVAILABLE_NFTS);
                assert!(cause.contains("pool exhausted"));
            }
            other => panic!("expected Persistence, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_reads_fail_as_persistence_when_provider_down() {
        let chain = Arc::new(MockContractClient::new());
        chain.set_connected(false);
        let service = service_with(chain, Arc::new(MockAuctionStore::new()));

        let result = service.fetch_available_nfts().await;

        // Reads never surface Connection or RetryExhausted.
        match result.unwrap_err() {
            ApiError::Persistence { operation, .. } => {
                assert_eq!(operation, ops::GET_AVAILABLE_NFTS);
            }
            other => panic!("expected Persistence, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_ongoing_auctions_newest_first() {
        let store = Arc::new(MockAuctionStore::new());
        store.push_auction(MockAuctionStore::sample_auction(1, "2024-01-01T00:00:00Z"));
        store.push_auction(MockAuctionStore::sample_auction(2, "2024-06-01T00:00:00Z"));
        let service = service_with(Arc::new(MockContractClient::new()), store);

        let auctions = service.fetch_ongoing_auctions().await.unwrap();

        assert_eq!(auctions.len(), 2);
        assert_eq!(auctions[0].id, 2);
        assert_eq!(auctions[1].id, 1);
    }

    #[tokio::test]
    async fn test_health_check_reports_provider_outage() {
        let chain = Arc::new(MockContractClient::new());
        chain.set_connected(false);
        let service = service_with(chain, Arc::new(MockAuctionStore::new()));

        let health = service.health_check().await;

        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert_eq!(health.database, HealthStatus::Healthy);
        assert_eq!(health.blockchain, HealthStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_health_check_reports_database_outage() {
        let store = Arc::new(MockAuctionStore::new());
        store.set_healthy(false);
        let service = service_with(Arc::new(MockContractClient::new()), store);

        let health = service.health_check().await;

        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert_eq!(health.database, HealthStatus::Unhealthy);
        assert_eq!(health.blockchain, HealthStatus::Healthy);
    }
}
