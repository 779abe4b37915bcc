//! Personal finance tracker API.
//!
//! Library target so integration tests can build the router in-process.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod state;
pub mod transactions;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use state::AppState;
