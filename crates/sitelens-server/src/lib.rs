//! sitelens server: REST API and CLI plumbing around the extraction pipeline.

pub mod config;
pub mod error;
pub mod rest;

pub use error::ApiError;
pub use rest::{router, AppState};
