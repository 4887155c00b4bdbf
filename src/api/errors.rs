use thiserror::Error;

/// Failures surfaced by the backend API layer.
///
/// Display output is plain prose: workflow errors shown to the user carry
/// these messages verbatim.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, TLS, timeout, or non-success HTTP status failures
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Network failures reported with a plain message
    #[error("{0}")]
    Network(String),

    /// Operation errors reported by the backend
    #[error("{}", .0.join("; "))]
    Graphql(Vec<String>),

    /// Response arrived but did not have the expected shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Unusable endpoint or credentials
    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Whether a retry of the same request could plausibly succeed.
    ///
    /// Only transport-level failures qualify; errors the backend reported
    /// about the operation itself will repeat on replay.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Network(_))
    }
}
