//! HTTP request handlers and the error-to-response mapping.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::error;
use validator::Validate;

use crate::app::AppState;
use crate::domain::{
    ApiError, AuctionRecord, ErrorBody, HealthResponse, HealthStatus, NftRecord, OperationResult,
    UpdatePriceRequest, WhitelistRequest, messages,
};

/// GET /contract/nfts
pub async fn list_nfts_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<NftRecord>>, ApiError> {
    let nfts = state.service.fetch_available_nfts().await?;
    Ok(Json(nfts))
}

/// GET /contract/auctions
pub async fn list_auctions_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AuctionRecord>>, ApiError> {
    let auctions = state.service.fetch_ongoing_auctions().await?;
    Ok(Json(auctions))
}

/// PATCH /contract/admin/sales/price
pub async fn update_price_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpdatePriceRequest>, JsonRejection>,
) -> Result<Json<OperationResult>, ApiError> {
    let Json(payload) = payload.map_err(|_| ApiError::invalid_input(messages::MISSING_FIELDS))?;
    payload
        .validate()
        .map_err(|_| ApiError::invalid_input(messages::MISSING_FIELDS))?;

    let outcome = state.service.update_price(&payload).await?;
    Ok(Json(outcome.into_result()))
}

/// PATCH /contract/admin/sales/whitelist
pub async fn add_to_whitelist_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<WhitelistRequest>, JsonRejection>,
) -> Result<Json<OperationResult>, ApiError> {
    let Json(payload) = payload.map_err(|_| ApiError::invalid_input(messages::MISSING_FIELDS))?;
    payload
        .validate()
        .map_err(|_| ApiError::invalid_input(messages::MISSING_FIELDS))?;

    let outcome = state.service.add_to_whitelist(&payload).await?;
    Ok(Json(outcome.into_result()))
}

/// DELETE /contract/admin/sales/whitelist
///
/// Only the caller address is required here; a blank target address is a
/// benign no-op handled by the service.
pub async fn remove_from_whitelist_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<WhitelistRequest>, JsonRejection>,
) -> Result<Json<OperationResult>, ApiError> {
    let Json(payload) = payload.map_err(|_| ApiError::invalid_input(messages::MISSING_FIELDS))?;
    if payload.caller_address.trim().is_empty() {
        return Err(ApiError::invalid_input(messages::MISSING_FIELDS));
    }

    let outcome = state.service.remove_from_whitelist(&payload).await?;
    Ok(Json(outcome.into_result()))
}

/// GET /health
pub async fn health_check_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let health = state.service.health_check().await;
    Json(health)
}

/// GET /health/live
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    let health = state.service.health_check().await;
    match health.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, String::new()),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_type) = match &self {
            ApiError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            ApiError::Connection(_) => (StatusCode::SERVICE_UNAVAILABLE, "provider_connection"),
            ApiError::Unauthorized => (StatusCode::FORBIDDEN, "unauthorized"),
            ApiError::RetryExhausted { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "retry_exhausted")
            }
            ApiError::Operation { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "contract_operation")
            }
            ApiError::Persistence { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "persistence"),
        };

        let message = self.to_string();
        if status.is_server_error() {
            error!(error_type, %message, "request failed");
        }

        let body = Json(ErrorBody {
            status_code: status.as_u16(),
            message,
            error_type: error_type.to_string(),
            timestamp: Utc::now(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChainError, ops};

    #[test]
    fn test_invalid_input_maps_to_400() {
        let response = ApiError::invalid_input("Invalid Ethereum address").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_connection_maps_to_503() {
        let response = ApiError::Connection("connection refused".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_unauthorized_maps_to_403() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_retry_exhausted_maps_to_500() {
        let response = ApiError::RetryExhausted {
            operation: ops::SET_PRICES,
            contract_address: "0xabc".to_string(),
            attempts: 3,
            cause: ChainError::Rpc("timeout".to_string()),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_persistence_maps_to_500() {
        let response = ApiError::Persistence {
            operation: ops::GET_AVAILABLE_NFTS,
            cause: "pool exhausted".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
