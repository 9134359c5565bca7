//! Contracts API backend.
//!
//! REST service exposing cached NFT auction state and privileged
//! operations against an ERC-721 sales contract.
//!
//! # Architecture Overview
//!
//! The crate is organized into four layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                   API Layer                  │
//! │  HTTP handlers, routing, auth, rate limits   │
//! ├─────────────────────────────────────────────┤
//! │               Application Layer              │
//! │   Operation orchestration, retry executor    │
//! ├─────────────────────────────────────────────┤
//! │                 Domain Layer                 │
//! │   Traits, types, errors (no dependencies)    │
//! ├─────────────────────────────────────────────┤
//! │             Infrastructure Layer             │
//! │   PostgreSQL store, alloy contract client    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Every privileged write follows the same guard chain: input validation,
//! a provider liveness probe, a single-shot on-chain role check, then the
//! contract call under a bounded linear-backoff retry. Benign no-ops
//! (already whitelisted, nothing to remove) are reported as successful
//! responses with `success: false`, not as errors.

pub mod api;
pub mod app;
pub mod domain;
pub mod infra;

// Test utilities are available in tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
