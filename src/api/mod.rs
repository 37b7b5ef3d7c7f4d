//! Public entry points exposed over HTTP.

pub mod http;

pub use http::{router, serve, AppState, LIVENESS};
