//! Persistence implementations.

pub mod postgres;

pub use postgres::{PostgresConfig, PostgresStore};
