use thiserror::Error;

/// Failures reported by a sheet source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed source data: {0}")]
    Malformed(String),
}

/// Failures surfaced to the serving layer. Cloneable so one failed
/// recomputation can be handed to every waiting reader.
#[derive(Debug, Clone, Error)]
pub enum LeaderboardError {
    #[error("could not retrieve source data: {reason}")]
    SourceUnavailable { reason: String },

    #[error("recomputation ended without a result")]
    Interrupted,
}

impl From<FetchError> for LeaderboardError {
    fn from(err: FetchError) -> Self {
        LeaderboardError::SourceUnavailable {
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required but not set")]
    Missing(&'static str),

    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

pub type LeaderboardResult<T> = Result<T, LeaderboardError>;
