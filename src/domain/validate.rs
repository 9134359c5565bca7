//! Pure input validators for addresses and monetary values.
//!
//! No I/O, no side effects. These run before any collaborator is touched
//! so malformed input fails fast with `ApiError::InvalidInput`.

use super::error::ApiError;
use super::constants::messages;

/// Checks that `address` is a `0x`-prefixed 40-hex-digit string
/// (the equivalent of `^0x[0-9a-fA-F]{40}$`). Case-insensitive, no
/// checksum validation.
pub fn validate_address(address: &str) -> Result<(), ApiError> {
    let hex = address
        .strip_prefix("0x")
        .ok_or_else(|| ApiError::invalid_input(messages::ETH_ADDRESS_INVALID))?;

    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ApiError::invalid_input(messages::ETH_ADDRESS_INVALID));
    }

    Ok(())
}

/// Checks that `price` parses as a finite, non-negative decimal number.
/// Empty or whitespace-only input fails. The fixed-point conversion to the
/// contract's 18-decimal unit happens later, in the chain adapter.
pub fn validate_price(price: &str) -> Result<(), ApiError> {
    let trimmed = price.trim();
    if trimmed.is_empty() {
        return Err(ApiError::invalid_input(messages::PRICE_INVALID));
    }

    let value: f64 = trimmed
        .parse()
        .map_err(|_| ApiError::invalid_input(messages::PRICE_INVALID))?;

    if !value.is_finite() {
        return Err(ApiError::invalid_input(messages::PRICE_INVALID));
    }
    if value < 0.0 {
        return Err(ApiError::invalid_input(messages::PRICE_NEGATIVE));
    }

    Ok(())
}
