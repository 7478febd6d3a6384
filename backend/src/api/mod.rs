//! HTTP API module.
//!
//! The upload page, the reshape/download endpoints and the SSE log stream.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::{build_router, start_server, AppState};
pub use types::*;
