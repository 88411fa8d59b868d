use thiserror::Error;

/// Failures raised by the analysis core.
///
/// Alignments that do not fit inside a target are not errors; the scorer
/// reports those as `None`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("stride must be at least 1 (got {0})")]
    InvalidStride(usize),
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
