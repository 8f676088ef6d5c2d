use thiserror::Error;

/// Search input was rejected before ranking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("empty search query")]
    EmptyQuery,
}

#[derive(Debug, Error)]
pub enum PublishError {
    /// The authoring credential could not be obtained.
    #[error("publisher account unavailable: {0}")]
    Unavailable(String),
    #[error("failed to publish results page: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum OrderError {
    /// The gateway rejected the request or returned an unusable response.
    #[error("payment gateway error: {reason}")]
    Gateway {
        reason: String,
        details: Option<serde_json::Value>,
    },
    #[error("payment gateway request failed")]
    Transport(#[from] reqwest::Error),
}
