//! Error handling primitives shared across the service.

use std::fmt;

/// Stable error codes surfaced in logs and mapped onto HTTP statuses.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    /// Success code used as a sentinel in request logs.
    Ok = 0,
    /// An artifact file could not be found or opened.
    ArtifactMissing = 1,
    /// An artifact file was read but failed to parse or validate.
    ArtifactCorrupt = 2,
    /// An artifact was written with a format version this build cannot read.
    ArtifactIncompatible = 3,
    /// Request body failed to parse as a feature vector.
    InvalidInput = 4,
    /// Feature vector length does not match the loaded artifacts.
    DimensionMismatch = 5,
    /// Catch-all for bugs.
    Internal = 6,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Ok => "ok",
            ErrorCode::ArtifactMissing => "artifact_missing",
            ErrorCode::ArtifactCorrupt => "artifact_corrupt",
            ErrorCode::ArtifactIncompatible => "artifact_incompatible",
            ErrorCode::InvalidInput => "invalid_input",
            ErrorCode::DimensionMismatch => "dimension_mismatch",
            ErrorCode::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical error type for the service.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{msg}")]
pub struct ServeError {
    /// Machine parsable error code.
    pub code: ErrorCode,
    /// Human readable message, returned verbatim to HTTP callers.
    pub msg: String,
}

/// Result alias used throughout the crate.
pub type ServeResult<T> = Result<T, ServeError>;

impl ServeError {
    /// Create a new error with the provided code and message.
    pub fn new(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
        }
    }

    /// Validation helper.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    /// Shape helper used when a row does not fit the loaded artifacts.
    pub fn dimension_mismatch(got: usize, expected: usize) -> Self {
        Self::new(
            ErrorCode::DimensionMismatch,
            format!("feature vector has {got} values, but the model expects {expected}"),
        )
    }

    pub fn artifact_missing(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ArtifactMissing, msg)
    }

    pub fn artifact_corrupt(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ArtifactCorrupt, msg)
    }

    pub fn artifact_incompatible(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ArtifactIncompatible, msg)
    }

    /// Internal error helper.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }
}
