use sd_core::CanvasId;
use thiserror::Error;

/// Why a canvas could not be saved. Saves that fail keep the in-memory
/// scene untouched and are retried on the next trigger.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save of canvas {canvas} rejected: {reason}")]
    Rejected { canvas: CanvasId, reason: String },

    #[error("save interface unavailable: {0}")]
    Unavailable(String),

    #[error("failed to serialize canvas configuration: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to encode canvas snapshot: {0}")]
    Snapshot(#[from] rmp_serde::encode::Error),

    #[error("save task ended before completing")]
    Aborted,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid editor config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
