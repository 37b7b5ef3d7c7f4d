//! Request and result types for a single prediction.

use serde::{Deserialize, Serialize};

use crate::common::error::{ServeError, ServeResult};

/// Body accepted by `POST /predict`.
#[derive(Clone, Debug, Deserialize)]
pub struct PredictRequest {
    pub features: Vec<f64>,
}

impl PredictRequest {
    /// Decode a raw request body; any decoding failure is an input error.
    pub fn from_slice(body: &[u8]) -> ServeResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ServeError::invalid("request body is empty"));
        }
        serde_json::from_slice(body).map_err(|err| ServeError::invalid(err.to_string()))
    }
}

/// Outcome of one inference call.
#[derive(Clone, Debug, Serialize)]
pub struct Prediction {
    pub potability: i64,
    #[serde(skip)]
    pub latency_us: u64,
}
