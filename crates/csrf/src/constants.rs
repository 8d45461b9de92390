//! CSRF wire constants
//!
//! These values are shared with the backend and must not drift.

/// Path of the token endpoint, appended to the configured base URL.
pub const TOKEN_PATH: &str = "/api/csrf-token";

/// Request header carrying the token on mutating requests.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Substring of a 403 `detail` field that marks a stale/invalid token.
/// Matched case-sensitively; other 403s are never retried.
pub const CSRF_REJECTION_MARKER: &str = "CSRF";
