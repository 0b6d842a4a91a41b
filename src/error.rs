use thiserror::Error;

use crate::parameters::{BoundsError, ParameterError};

/// Error types for the xps-fit library.
#[derive(Error, Debug)]
pub enum XpsFitError {
    /// Caller-supplied guesses or settings were rejected before any fit ran.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The fit-window energy column had no defined values.
    #[error("Fit window is empty: the fit-region energy column has no values")]
    EmptyFitWindow,

    /// The fit-window energy grid does not line up with the full energy grid.
    #[error("Data alignment error: {0}")]
    DataAlignment(String),

    /// A derived quantity is undefined for this result (e.g. zero total area).
    #[error("Degenerate result: {0}")]
    DegenerateResult(String),

    /// The optimizer stopped without meeting any convergence criterion.
    #[error("Fit stage '{stage}' did not converge: {message}")]
    NonConvergence { stage: String, message: String },

    /// Error indicating a mismatch in array dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error indicating a singular matrix was encountered.
    #[error("Singular matrix encountered")]
    SingularMatrix,

    /// Error during function evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// Error for parameter-related problems.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// Malformed instrument export.
    #[error("Table error: {0}")]
    Table(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decoding error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<BoundsError> for XpsFitError {
    fn from(err: BoundsError) -> Self {
        XpsFitError::Parameter(ParameterError::Bounds(err))
    }
}

/// Result type alias for xps-fit operations.
pub type Result<T> = std::result::Result<T, XpsFitError>;
