//! Crate error type
//!
//! Runtime navigation never fails with an error: searches report `ok = false`
//! and behavior tree nodes report `Failure`. Errors only come out of
//! construction and configuration.

use thiserror::Error;

/// Errors raised while building grids or loading configuration
#[derive(Debug, Error)]
pub enum NavError {
    /// Grid width or height is zero, or the tile size is not positive
    #[error("invalid grid dimensions {width}x{height} (tile size {tile_size})")]
    InvalidGridDimensions {
        /// Requested width in cells
        width: usize,
        /// Requested height in cells
        height: usize,
        /// Requested tile size
        tile_size: f32,
    },

    /// Occupancy buffer length does not match `width * height`
    #[error("occupancy has {actual} cells, expected {expected}")]
    OccupancyLength {
        /// `width * height`
        expected: usize,
        /// Length of the supplied buffer
        actual: usize,
    },

    /// An ASCII map row is malformed
    #[error("map row {row}: {reason}")]
    MalformedMap {
        /// Zero-based row index
        row: usize,
        /// What was wrong with it
        reason: String,
    },

    /// A configuration value is out of range
    #[error("invalid config value `{field}`: {reason}")]
    InvalidConfig {
        /// Field name
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// RON configuration could not be parsed
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// JSON configuration could not be parsed
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result alias
pub type Result<T> = std::result::Result<T, NavError>;
