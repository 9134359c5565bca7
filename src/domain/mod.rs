//! Core domain: types, error taxonomy, validators, and collaborator traits.
//!
//! This layer has no knowledge of axum, sqlx, or alloy. Everything here is
//! either pure or expressed against the traits in [`traits`].

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;
pub mod validate;

pub use constants::{messages, ops};
pub use error::{ApiError, ChainError, ConfigError, StoreError};
pub use traits::{AuctionStore, ContractClient};
pub use types::{
    AuctionRecord, AuctionStatus, ErrorBody, HealthResponse, HealthStatus, NftRecord,
    OperationOutcome, OperationResult, Role, UpdatePriceRequest, WhitelistAddOutcome,
    WhitelistRequest,
};
pub use validate::{validate_address, validate_price};
