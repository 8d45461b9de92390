//! Classified request failures
//!
//! Every terminal failure of `Dispatcher::send` is a `ClassifiedError`. Its
//! Display output is the user-facing message, so callers can surface it as-is.

use std::fmt;

/// Failure taxonomy, stable across backend wording changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No response was received
    NetworkError,
    /// A token could not be obtained, so the request was never sent
    CsrfUnavailable,
    /// The token was rejected again after the one permitted refresh
    CsrfRejected,
    /// 4xx (and other non-5xx failures)
    ClientError,
    /// 5xx
    ServerError,
}

impl ErrorKind {
    /// Label for logging and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::NetworkError => "network_error",
            ErrorKind::CsrfUnavailable => "csrf_unavailable",
            ErrorKind::CsrfRejected => "csrf_rejected",
            ErrorKind::ClientError => "client_error",
            ErrorKind::ServerError => "server_error",
        }
    }
}

/// HTTP status of the failed exchange, or `Network` when there was none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStatus {
    Http(u16),
    Network,
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorStatus::Http(code) => write!(f, "{code}"),
            ErrorStatus::Network => write!(f, "network"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ClassifiedError {
    pub status: ErrorStatus,
    pub kind: ErrorKind,
    pub message: String,
}

impl ClassifiedError {
    pub fn new(status: ErrorStatus, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    /// HTTP status code, if a response was received.
    pub fn status_code(&self) -> Option<u16> {
        match self.status {
            ErrorStatus::Http(code) => Some(code),
            ErrorStatus::Network => None,
        }
    }
}
