//! Error types for CSRF token retrieval

/// Errors from fetching a CSRF token.
///
/// `Clone` because one fetch result is handed to every coalesced caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("token request failed: {0}")]
    Transport(String),

    #[error("token endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed token response: {0}")]
    Malformed(String),
}

impl Error {
    /// Non-success status returned by the token endpoint, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Rejected { status, .. } => Some(*status),
            Error::Transport(_) | Error::Malformed(_) => None,
        }
    }
}

/// Result alias for token operations.
pub type Result<T> = std::result::Result<T, Error>;
