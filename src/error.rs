use thiserror::Error;

use crate::parameters::bounds::BoundsError;

/// Error types for the xpsfit-rs library.
#[derive(Error, Debug)]
pub enum PeakFitError {
    /// A bounded value was constructed from a specification with no usable fields.
    #[error("Invalid specification: {0}")]
    InvalidSpecification(String),

    /// A component name is already taken in the collection.
    #[error("Duplicate component name: {0}")]
    DuplicateName(String),

    /// A component name is empty or otherwise unusable.
    #[error("Invalid component name: {0:?}")]
    InvalidName(String),

    /// No component with this name exists.
    #[error("Component not found: {0}")]
    NotFound(String),

    /// Parameter not found on a component.
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    /// A line shape needs an independent variable that was not supplied.
    #[error("Missing independent variable '{variable}' for component '{component}'")]
    MissingIndependentVariable { component: String, variable: String },

    /// A required column is absent from a data file.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A required metadata directive is absent from a data file.
    #[error("Missing metadata: {0}")]
    MissingMetadata(String),

    /// A fit was requested without any data points.
    #[error("No data to fit")]
    NoData,

    /// The solver reported failure; parameters were left unchanged.
    #[error("Solver did not converge: {0}")]
    SolverDidNotConverge(String),

    /// Explicitly unsupported input.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Error indicating a mismatch in array dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error for boundary violations.
    #[error("Bounds error: {0}")]
    Bounds(#[from] BoundsError),

    /// Weights that are negative or not finite.
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    /// Error during function evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// Malformed data file content.
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for xpsfit-rs operations.
pub type Result<T> = std::result::Result<T, PeakFitError>;
