use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Cannot compute statistics for an empty series")]
    EmptyInput,

    #[error("Transformation failed during aggregation: {0}")]
    Transform(#[from] transforms::TransformError),
}
