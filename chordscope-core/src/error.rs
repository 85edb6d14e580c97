//! Error types for the chord detector.
//!
//! Per-frame numeric edge cases never show up here: they are absorbed where
//! they happen. Only upstream acquisition failures and caller contract
//! violations are reported.

use thiserror::Error;

/// Errors surfaced by a detector session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectorError {
    /// The spectrum source could not be acquired (no device, permission
    /// denied, unsupported format, stream failure).
    #[error("spectrum source unavailable: {0}")]
    UpstreamUnavailable(String),

    /// A frame did not have the session's fixed bin count.
    #[error("spectrum has {actual} bins, expected {expected}")]
    SpectrumLength { expected: usize, actual: usize },

    /// The detector configuration was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, DetectorError>;
