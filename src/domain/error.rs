//! Error types: per-collaborator failures plus the classified taxonomy
//! consumed by the transport layer.

use thiserror::Error;

use super::constants::messages;

/// Failures raised by the chain client adapter.
#[derive(Error, Debug, Clone)]
pub enum ChainError {
    #[error("RPC transport failed: {0}")]
    Rpc(String),
    #[error("Contract call reverted: {0}")]
    Reverted(String),
    #[error("Transaction failed: {0}")]
    Transaction(String),
    #[error("Invalid call argument: {0}")]
    InvalidArgument(String),
}

/// Failures raised by the cache store adapter.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Query execution failed: {0}")]
    Query(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                StoreError::Connection(err.to_string())
            }
            _ => StoreError::Query(err.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Classified failure taxonomy for orchestrator operations.
///
/// Each failing call produces exactly one of these; chain-call failures are
/// wrapped once, at the point they exit the retry executor, and are never
/// wrapped again further up.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed address or price. Surfaced immediately, never retried.
    #[error("{0}")]
    InvalidInput(String),

    /// The network liveness probe failed. Not retried by the guard.
    #[error("Provider connection failed: {0}")]
    Connection(String),

    /// Caller does not hold the admin role. Fails closed, never retried.
    #[error("{}", messages::MISSING_DEFAULT_ADMIN_ROLE)]
    Unauthorized,

    /// All bounded attempts of a chain call failed; carries the last cause.
    #[error("{operation} failed for contract {contract_address} after {attempts} attempts: {cause}")]
    RetryExhausted {
        operation: &'static str,
        contract_address: String,
        attempts: u32,
        #[source]
        cause: ChainError,
    },

    /// A non-retry-path failure, e.g. the single-shot authorization query.
    #[error("{operation} failed for contract {contract_address}: {cause}")]
    Operation {
        operation: &'static str,
        contract_address: String,
        #[source]
        cause: ChainError,
    },

    /// Read-path cache-store or connectivity failure. No retry semantics.
    #[error("{operation} failed: {cause}")]
    Persistence {
        operation: &'static str,
        cause: String,
    },
}

impl ApiError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::InvalidInput(message.into())
    }
}
