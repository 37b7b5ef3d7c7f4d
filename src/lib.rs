// lib.rs - water potability prediction service
pub mod api;
pub mod common;
pub mod inference;
pub mod store;

pub use common::{ErrorCode, ServeError, ServeResult};
pub use store::ModelStore;
