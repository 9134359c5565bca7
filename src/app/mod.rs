//! Application layer: orchestration service, retry executor, and shared
//! server state.

pub mod retry;
pub mod service;
pub mod state;

pub use retry::RetryPolicy;
pub use service::ContractService;
pub use state::AppState;
