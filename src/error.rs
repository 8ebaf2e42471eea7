//! Error types for beam-sim

use thiserror::Error;

/// Failures raised at the solver boundary.
///
/// These come from running the external solver or reading its result files.
/// Extraction never recovers from them; they abort the run unchanged.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Parsing error: {0}")]
    ParsingError(String),

    #[error("Result '{0}' not available in the loaded result set")]
    MissingResult(String),
}

/// Main error type for beam-sim operations
#[derive(Debug, Error)]
pub enum BeamSimError {
    #[error("Unsupported field label '{0}'")]
    UnsupportedLabel(String),

    #[error("Unsupported component '{component}' for {label} field")]
    UnsupportedComponent { label: String, component: String },

    #[error("Field sample is empty, nothing to summarise")]
    EmptySample,

    #[error("Unexpected displacement shape: {rows}x{cols}")]
    UnexpectedShape { rows: usize, cols: usize },

    #[error("Field length mismatch: expected {expected} values, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type for beam-sim operations
pub type SimResult<T> = Result<T, BeamSimError>;
