//! Error types for spark-reveal.
//!
//! The runtime never fails: stale callbacks, unknown directions and duplicate
//! attaches all degrade to a no-op. Errors exist only at the configuration
//! boundary, where a host turns external props into typed ones.

use thiserror::Error;

/// Configuration error raised while loading primitive props.
#[derive(Error, Debug)]
pub enum RevealError {
    /// Props document is not valid JSON or has the wrong shape
    #[error("Invalid props: {0}")]
    Json(#[from] serde_json::Error),

    /// A numeric field is negative or not finite
    #[error("Invalid value for `{field}`: {value}")]
    InvalidValue { field: &'static str, value: f64 },

    /// Element kind is not one of block/inline/paragraph/heading-1..6
    #[error("Unknown element kind: {0:?}")]
    UnknownElementKind(String),
}

/// Result alias for configuration loading.
pub type Result<T> = std::result::Result<T, RevealError>;
