//! Response classification
//!
//! Maps a failed response (status + parsed body) to a `ClassifiedError` with a
//! user-presentable message. A message supplied by the server wins over the
//! status table; the table covers everything else.
//!
//! Also owns CSRF rejection detection: a 403 whose `detail` contains the
//! `CSRF` marker. That substring match is the only signal separating "stale
//! token, retry" from "forbidden, give up".

use serde_json::Value;

use csrf::CSRF_REJECTION_MARKER;

use crate::error::{ClassifiedError, ErrorKind, ErrorStatus};

/// Message for failures where no response arrived.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";

/// Message for requests abandoned because no CSRF token could be obtained.
pub const CSRF_UNAVAILABLE_MESSAGE: &str =
    "Could not obtain a security token. Please reload and try again.";

const GENERIC_SERVER_ERROR: &str = "An unexpected server error occurred. Please try again later.";
const GENERIC_CLIENT_ERROR: &str = "The request could not be completed.";

/// Default message for a status, before any server-supplied text.
pub fn status_message(status: u16) -> &'static str {
    match status {
        400 => "Invalid request. Please check your input.",
        401 => "Authentication required. Please sign in.",
        403 => "Access denied. You do not have permission to perform this action.",
        404 => "The requested resource was not found.",
        409 => "Conflict. The resource was modified or already exists.",
        413 => "The request is too large.",
        422 => "Validation failed. Please check your input.",
        429 => "Too many requests. Please wait a moment and try again.",
        500 => "Internal server error. Please try again later.",
        502 => "Bad gateway. The server is temporarily unreachable.",
        503 => "Service unavailable. Please try again later.",
        504 => "The server timed out. Please try again.",
        s if s >= 500 => GENERIC_SERVER_ERROR,
        _ => GENERIC_CLIENT_ERROR,
    }
}

/// Parse an error body leniently: anything that is not JSON becomes `Null`.
pub fn parse_error_body(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or(Value::Null)
}

/// Extract a usable server-supplied message.
///
/// Checked in order: `detail` string, `detail` list of `{msg}` entries
/// (validation errors), `message` string, `error` string. Blank strings are
/// ignored.
pub fn body_message(body: &Value) -> Option<String> {
    let usable = |s: &str| (!s.trim().is_empty()).then(|| s.to_string());

    match body.get("detail") {
        Some(Value::String(detail)) => {
            if let Some(msg) = usable(detail) {
                return Some(msg);
            }
        }
        Some(Value::Array(items)) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .filter(|m| !m.trim().is_empty())
                .collect();
            if !msgs.is_empty() {
                return Some(msgs.join("; "));
            }
        }
        _ => {}
    }

    ["message", "error"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(Value::as_str))
        .find_map(usable)
}

/// Classify a non-2xx response.
pub fn classify(status: u16, body: &Value) -> ClassifiedError {
    let kind = if status >= 500 {
        ErrorKind::ServerError
    } else {
        ErrorKind::ClientError
    };
    let message = body_message(body).unwrap_or_else(|| status_message(status).to_string());
    ClassifiedError::new(ErrorStatus::Http(status), kind, message)
}

/// Whether a response is the backend's stale/invalid CSRF token rejection.
pub fn is_csrf_rejection(status: u16, body: &Value) -> bool {
    status == 403
        && body
            .get("detail")
            .and_then(Value::as_str)
            .is_some_and(|detail| detail.contains(CSRF_REJECTION_MARKER))
}

/// Failure for a request that never got a response.
pub fn network_error() -> ClassifiedError {
    ClassifiedError::new(
        ErrorStatus::Network,
        ErrorKind::NetworkError,
        NETWORK_ERROR_MESSAGE,
    )
}

/// Failure for a request abandoned because the token fetch failed.
pub fn csrf_unavailable(err: &csrf::Error) -> ClassifiedError {
    let status = err
        .status()
        .map_or(ErrorStatus::Network, ErrorStatus::Http);
    ClassifiedError::new(status, ErrorKind::CsrfUnavailable, CSRF_UNAVAILABLE_MESSAGE)
}
