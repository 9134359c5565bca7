//! Environment-driven application configuration.

use secrecy::SecretString;

use crate::domain::ConfigError;

/// Runtime configuration assembled from environment variables.
#[derive(Clone)]
pub struct AppConfig {
    /// WebSocket JSON-RPC endpoint of the Ethereum node.
    pub ws_url: String,
    /// Deployed NFT contract address.
    pub nft_contract: String,
    /// Hex-encoded private key of the operator wallet.
    pub private_key: SecretString,
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Expected `x-api-key` value for admin routes.
    pub api_auth_key: SecretString,
    /// Address the HTTP server binds to.
    pub bind_addr: String,
}

impl AppConfig {
    /// Reads the configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` when a required variable is
    /// absent, and `ConfigError::InvalidValue` when `PORT` is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "PORT".to_string(),
                    message: format!("'{value}' is not a valid port"),
                })?,
            Err(_) => 3000,
        };

        Ok(Self {
            ws_url: require("WS_URL")?,
            nft_contract: require("NFT_CONTRACT")?,
            private_key: SecretString::from(require("PRIVATE_KEY")?),
            database_url: require("DATABASE_URL")?,
            api_auth_key: SecretString::from(require("API_AUTH_KEY")?),
            bind_addr: format!("0.0.0.0:{port}"),
        })
    }
}

fn require(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}
