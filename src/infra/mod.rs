//! Infrastructure adapters: configuration, observability, and the
//! production implementations of the domain traits.

pub mod blockchain;
pub mod config;
pub mod database;
pub mod observability;

pub use blockchain::EthereumContractClient;
pub use config::AppConfig;
pub use database::{PostgresConfig, PostgresStore};
