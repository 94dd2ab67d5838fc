//! # settle-client
//!
//! Client side of Settle: REST access to the backend, injected session
//! storage, the visitor request flow and the resident's polled request
//! board. Loading state is managed by `settle-core` controllers.
//!
//! ## Configuration
//!
//! - `SETTLE_API_URL` - API endpoint (default: `http://localhost:3001/api`)
//! - `SETTLE_SESSION_FILE` - session file (default: `settle-session.json`)
//! - `SETTLE_POLL_MS` - request board polling period in milliseconds

// CLI uses print! macros intentionally
#![allow(clippy::print_stdout)]

pub mod api;
pub mod board;
pub mod cli;
pub mod config;
pub mod flow;
pub mod models;
pub mod session;
pub mod storage;

pub use api::{ApiClient, ApiError, Backend};
pub use board::{RequestAction, RequestBoard};
pub use cli::{Cli, Commands};
pub use config::ClientConfig;
pub use flow::{CommunicationFlow, FlowError};
pub use session::{AuthSession, SessionError};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError};

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        assert!(!super::config::DEFAULT_API_URL.is_empty());
    }
}
