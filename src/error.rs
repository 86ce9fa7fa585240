use thiserror::Error;

/// Fatal conditions. Negative detection results and deferred merges are not errors.
#[derive(Error, Debug)]
pub enum BubbleError {
    #[error("Input/Output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed input at line {line}: {message}")]
    MalformedInput { line: usize, message: String },

    #[error("Graph invariant violated: {0}")]
    InvariantViolation(String),

    #[error("No covered node of length >= {min_length} to compute average coverage from")]
    DegenerateCoverage { min_length: usize },

    #[error("Report serialization error: {0}")]
    Report(#[from] bincode::Error),
}

impl BubbleError {
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        BubbleError::MalformedInput { line, message: message.into() }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        BubbleError::InvariantViolation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, BubbleError>;
