use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Timestamps must be strictly increasing: violation at position {0}")]
    UnorderedIndex(usize),

    #[error("Index and values have different lengths: {index} vs {values}")]
    LengthMismatch { index: usize, values: usize },

    #[error("Non-finite value at position {0}; use an explicit missing value instead")]
    NonFiniteValue(usize),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),
}
