//! User-facing messages and operation names used in logs and classified errors.

/// Result and rejection messages surfaced to API clients.
pub mod messages {
    pub const ALREADY_WHITELISTED: &str = "Address is already whitelisted";
    pub const ETH_ADDRESS_INVALID: &str = "Invalid Ethereum address";
    pub const MISSING_DEFAULT_ADMIN_ROLE: &str = "Caller lacks DEFAULT_ADMIN_ROLE";
    pub const MISSING_FIELDS: &str = "Missing required fields";
    pub const NO_ADDRESS_PROVIDED: &str = "No address specified";
    pub const NOT_IN_WHITELIST: &str = "Address not found in whitelist";
    pub const PRICE_INVALID: &str = "Invalid price value";
    pub const PRICE_NEGATIVE: &str = "Price must be positive";
    pub const PRICE_UPDATED: &str = "Price updated successfully";
    pub const WHITELIST_ADDED: &str = "Address successfully whitelisted";
    pub const WHITELIST_REMOVED: &str = "Address removed from whitelist";
}

/// Operation names carried through the retry executor for logging and
/// error attribution. Never persisted.
pub mod ops {
    pub const ADD_WHITELIST_ADDRESS: &str = "Add address to whitelist";
    pub const GET_AVAILABLE_NFTS: &str = "Retrieve available NFTs";
    pub const GET_ONGOING_AUCTIONS: &str = "Retrieve ongoing auctions";
    pub const REMOVE_WHITELIST_ADDRESS: &str = "Remove address from whitelist";
    pub const SET_PRICES: &str = "Update NFT prices";
    pub const VERIFY_ROLE: &str = "Verify admin role";
    pub const VERIFY_WHITELIST_STATUS: &str = "Verify whitelist status";
}
