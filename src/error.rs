use thiserror::Error;

/// Error types for the peakforge-rs library.
///
/// Numerical degeneracy (singular pivots, non-convergence, tiny inputs) is
/// never reported here; it degrades gracefully inside the algorithms. These
/// variants cover malformed caller input only.
#[derive(Error, Debug)]
pub enum PeakForgeError {
    /// An anchor index does not address a point of the input spectrum.
    #[error("Invalid anchor index {index}: spectrum has {len} points")]
    InvalidAnchorIndex {
        /// The offending index
        index: usize,
        /// Number of points in the spectrum
        len: usize,
    },

    /// Error indicating a mismatch in vector or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for peakforge-rs operations.
pub type Result<T> = std::result::Result<T, PeakForgeError>;
