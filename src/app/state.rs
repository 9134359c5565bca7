//! Shared application state handed to request handlers via Axum's
//! `State` extractor.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use secrecy::SecretString;

use crate::domain::{AuctionStore, ContractClient};

use super::service::ContractService;

/// Shared state for the web server. Everything is behind `Arc`, so the
/// struct is cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    /// The orchestration service containing business logic.
    pub service: Arc<ContractService>,

    /// Expected value of the `x-api-key` header on admin routes.
    pub api_auth_key: SecretString,

    /// Prometheus render handle. Absent in most tests.
    pub metrics: Option<Arc<PrometheusHandle>>,
}

impl AppState {
    /// Wires a new state, constructing the service from the given
    /// collaborators.
    #[must_use]
    pub fn new(
        chain: Arc<dyn ContractClient>,
        store: Arc<dyn AuctionStore>,
        api_auth_key: SecretString,
    ) -> Self {
        let service = Arc::new(ContractService::new(chain, store));

        Self {
            service,
            api_auth_key,
            metrics: None,
        }
    }

    /// Attaches a Prometheus render handle for the `/metrics` route.
    #[must_use]
    pub fn with_metrics(mut self, handle: Arc<PrometheusHandle>) -> Self {
        self.metrics = Some(handle);
        self
    }
}
