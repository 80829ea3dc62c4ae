//! HTTP API over the retrieval pipeline: document upload and management,
//! question answering, search, and health.

mod error;
mod handlers;
mod router;
mod server;
mod state;

pub use error::GatewayError;
pub use server::GatewayServer;
pub use state::AppState;
