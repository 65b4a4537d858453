//! HTTP server: router, shared state, errors, and health endpoints.

pub mod error;
pub mod health;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use routes::build_router;
pub use state::AppState;
