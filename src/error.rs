use thiserror::Error;

/// Everything that can abort a benchmark run. None of these are retried.
#[derive(Debug, Error)]
pub enum Error {
    /// Encryption parameters rejected at context construction.
    #[error("invalid encryption parameters: {0}")]
    Configuration(String),

    /// The modulus chain cannot hold the result (level exhausted or magnitude too large).
    #[error("numeric overflow: {0}")]
    NumericOverflow(String),

    /// Two operands live at different levels or scales.
    #[error("operand mismatch: {0}")]
    OperandMismatch(String),

    /// Failure reported by a third-party encryption backend.
    #[error("backend failure: {0}")]
    Backend(String),

    /// Encoded values or ciphertexts outlived the trial that created them.
    #[error("{live} encrypted values still alive after trial {iteration}")]
    Leak { iteration: usize, live: usize },

    #[error("results file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed results file at line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
