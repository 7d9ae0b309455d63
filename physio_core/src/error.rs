//! Error types for the physio_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for physio_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A formula input fell outside its documented validity interval
    #[error("input '{field}' = {value} is outside the valid range [{min}, {max}]")]
    OutOfRangeInput {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Trajectory would exceed the sampler's point ceiling
    #[error("trajectory needs {requested} points, but at most {max} are allowed")]
    TrajectoryTooLarge { requested: usize, max: usize },

    /// Sweep axis is empty or longer than the configured maximum
    #[error("sweep axis '{axis}' has {len} values, expected 1..={max}")]
    SweepTooLarge {
        axis: String,
        len: usize,
        max: usize,
    },

    /// Step or horizon cannot describe a finite sampling grid
    #[error("Invalid sampling grid: {0}")]
    InvalidSampling(String),

    /// Degenerate geometry (zero range, zero target size, ...)
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A derived quantity left the region where the model is meaningful
    #[error("{quantity} = {value:.2} exceeds the model limit of {limit}")]
    ModelDomain {
        quantity: &'static str,
        value: f64,
        limit: f64,
    },

    /// A keyed lookup table has no entry for the requested combination
    #[error("Undefined for this combination: {0}")]
    UndefinedCombination(String),

    /// Parameter name not carried by the model's input
    #[error("model '{model}' has no parameter '{name}'")]
    UnknownParameter { model: &'static str, name: String },

    /// Output field is missing or not numeric
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    /// Model name not present in the catalog
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// Chemical not present in the exposure table
    #[error("Unknown chemical: {0}")]
    UnknownChemical(String),

    /// Text does not name any variant of a keyed option
    #[error("unknown {kind} '{value}' (expected one of: {expected})")]
    UnknownOption {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether a sweep may replace this failure with its sentinel value
    pub fn is_domain_failure(&self) -> bool {
        matches!(
            self,
            Error::OutOfRangeInput { .. } | Error::ModelDomain { .. }
        )
    }
}
