use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}
