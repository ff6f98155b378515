use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to build or send the HTTP request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Rate limited by the API after exhausting the retry budget: {0}")]
    RateLimited(String),

    #[error("The API returned a server-side error (HTTP {0}): {1}")]
    ServerError(u16, String),

    #[error("Unexpected API response status {0} for {1}")]
    UnexpectedStatus(u16, String),

    #[error("API credential rejected (HTTP {0})")]
    Unauthorized(u16),

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Equities provider error: {0}")]
    Equities(String),

    #[error("Failed to read or write the raw-data snapshot: {0}")]
    Snapshot(String),
}

impl ApiError {
    /// A transient failure: the offending asset/date is skipped and the run
    /// continues with reduced data.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::Request(_)
                | ApiError::RateLimited(_)
                | ApiError::ServerError(_, _)
                | ApiError::UnexpectedStatus(_, _)
                | ApiError::Equities(_)
        )
    }

    /// A fatal failure signalling systemic misconfiguration (bad credential,
    /// schema drift): aborts the run, no retry.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthorized(_) | ApiError::Deserialization(_) | ApiError::Snapshot(_)
        )
    }
}
