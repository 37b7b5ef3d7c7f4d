//! Shared utilities that glue the store, inference and HTTP layers together.
pub mod config;
pub mod error;
pub mod log;

pub use error::{ErrorCode, ServeError, ServeResult};
