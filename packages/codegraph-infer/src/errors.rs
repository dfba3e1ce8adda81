//! Error types for codegraph-infer
//!
//! Provides unified error handling across the crate. Missing candidate labels
//! are never errors: such nodes are pinned to the `unknown` label instead.

use crate::config::ConfigError;
use crate::shared::models::NodeId;
use thiserror::Error;

/// Main error type for codegraph-infer operations
#[derive(Debug, Error)]
pub enum InferenceError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error (rejected at setup)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Factor construction error
    #[error("Invalid factor: {0}")]
    InvalidFactor(String),

    /// Node id outside the query
    #[error("Node {node} out of range (query has {num_nodes} nodes)")]
    NodeOutOfRange { node: NodeId, num_nodes: usize },

    /// Model snapshot could not be encoded
    #[error("Snapshot encode error: {0}")]
    SnapshotEncode(#[from] rmp_serde::encode::Error),

    /// Model snapshot could not be decoded
    #[error("Snapshot decode error: {0}")]
    SnapshotDecode(#[from] rmp_serde::decode::Error),

    /// Diagnostic view could not be rendered
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot written by an incompatible version
    #[error("Unsupported snapshot version {found}, expected {expected}")]
    UnsupportedSnapshot { found: u32, expected: u32 },
}

impl InferenceError {
    /// Create an invalid factor error
    pub fn invalid_factor(msg: impl Into<String>) -> Self {
        InferenceError::InvalidFactor(msg.into())
    }
}

/// Result type alias for inference operations
pub type Result<T> = std::result::Result<T, InferenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_out_of_range_message() {
        let err = InferenceError::NodeOutOfRange {
            node: 7,
            num_nodes: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("Node 7"));
        assert!(msg.contains("3 nodes"));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: InferenceError = ConfigError::Validation("beam_size must be >= 1".into()).into();
        assert!(matches!(err, InferenceError::Config(_)));
        assert!(err.to_string().contains("beam_size"));
    }
}
