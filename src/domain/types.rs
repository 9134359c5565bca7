use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::constants::messages;

/// Cached ERC-721 record, owned by the persistence collaborator. The
/// orchestrator only reads these; lifecycle is driven by an external
/// event listener.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NftRecord {
    pub id: i32,
    pub token_id: String,
    pub owner: String,
    pub minted_at: DateTime<Utc>,
}

/// Lifecycle state of a cached auction record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    Active,
    Ended,
    Cancelled,
    Created,
    Extended,
}

impl AuctionStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Active => "active",
            AuctionStatus::Ended => "ended",
            AuctionStatus::Cancelled => "cancelled",
            AuctionStatus::Created => "created",
            AuctionStatus::Extended => "extended",
        }
    }
}

impl FromStr for AuctionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AuctionStatus::Active),
            "ended" => Ok(AuctionStatus::Ended),
            "cancelled" => Ok(AuctionStatus::Cancelled),
            "created" => Ok(AuctionStatus::Created),
            "extended" => Ok(AuctionStatus::Extended),
            other => Err(format!("unknown auction status: {other}")),
        }
    }
}

/// Cached auction record. Monetary columns are rendered as decimal strings
/// to preserve precision at the API boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuctionRecord {
    pub id: i32,
    pub address: String,
    pub token_id: String,
    pub creator: String,
    pub status: AuctionStatus,
    pub highest_bid: String,
    pub highest_bidder: Option<String>,
    pub min_bid_increment: String,
    pub duration: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// On-chain access-control roles the orchestrator cares about. The chain
/// adapter maps these to the contract's role identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    DefaultAdmin,
    Whitelisted,
}

/// Typed result of the whitelist-add chain write. The adapter decodes the
/// revert reason once, so the orchestrator never string-matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhitelistAddOutcome {
    Added,
    AlreadyWhitelisted,
}

/// Internal outcome of a write operation. Benign no-ops are explicit
/// variants rather than errors: the call succeeded, the chain state was
/// already where the caller wanted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Completed { message: &'static str },
    AlreadyWhitelisted,
    NotWhitelisted,
    NoAddress,
}

impl OperationOutcome {
    /// Flattens the outcome into the wire payload.
    #[must_use]
    pub fn into_result(self) -> OperationResult {
        match self {
            OperationOutcome::Completed { message } => OperationResult {
                success: true,
                message: message.to_string(),
            },
            OperationOutcome::AlreadyWhitelisted => OperationResult {
                success: false,
                message: messages::ALREADY_WHITELISTED.to_string(),
            },
            OperationOutcome::NotWhitelisted => OperationResult {
                success: false,
                message: messages::NOT_IN_WHITELIST.to_string(),
            },
            OperationOutcome::NoAddress => OperationResult {
                success: false,
                message: messages::NO_ADDRESS_PROVIDED.to_string(),
            },
        }
    }
}

/// Wire payload for write operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
}

/// Request payload for the price update endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePriceRequest {
    #[validate(length(min = 1, message = "Missing required fields"))]
    pub caller_address: String,
    #[validate(length(min = 1, message = "Missing required fields"))]
    pub new_price: String,
}

/// Request payload for both whitelist endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistRequest {
    #[validate(length(min = 1, message = "Missing required fields"))]
    pub caller_address: String,
    #[validate(length(min = 1, message = "Missing required fields"))]
    pub address: String,
}

/// Structured error body produced by the transport layer's error mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub message: String,
    pub error_type: String,
    pub timestamp: DateTime<Utc>,
}

/// Health check status for services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Health check response for the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub database: HealthStatus,
    pub blockchain: HealthStatus,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    #[must_use]
    pub fn new(database: HealthStatus, blockchain: HealthStatus) -> Self {
        let status = match (&database, &blockchain) {
            (HealthStatus::Healthy, HealthStatus::Healthy) => HealthStatus::Healthy,
            _ => HealthStatus::Unhealthy,
        };

        Self {
            status,
            database,
            blockchain,
            timestamp: Utc::now(),
        }
    }
}
