//! Vehicle maintenance cost prediction server
//!
//! Serves predictions from a trained pipeline over HTTP and logs every
//! request/response pair to SQLite.

pub mod api;
pub mod config;
pub mod error;

pub use api::{create_router, serve, AppState, PredictionRequest};
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
