//! Lectern HTTP API: axum router, route handlers and error mapping.
//!
//! Exposes the query endpoint, the course catalog endpoint and a root
//! liveness endpoint.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
