//! CSRF token endpoint interaction
//!
//! `GET {base}/api/csrf-token` answers `{"csrf_token": "<opaque>"}`. The token
//! is bound to the session cookie, which the transport's cookie store keeps.

use std::fmt;

use common::Secret;
use serde::Deserialize;
use transport::{HeaderValue, HttpRequest, Method, Transport};

use crate::error::{Error, Result};

/// Body of a successful token endpoint response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub csrf_token: String,
}

/// Opaque anti-CSRF credential. Redacted in Debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct CsrfToken(Secret<String>);

impl CsrfToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Secret::new(value.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose()
    }

    /// Header value marked sensitive so HTTP-level debug output hides it.
    pub fn header_value(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(self.expose())
            .map_err(|e| Error::Malformed(format!("token is not a valid header value: {e}")))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CsrfToken({:?})", self.0)
    }
}

/// Fetch a fresh token from `url`.
///
/// Transport failures, non-2xx statuses, and bodies without a non-empty
/// `csrf_token` string are all errors; nothing is cached here.
pub async fn fetch_token(transport: &dyn Transport, url: &str) -> Result<CsrfToken> {
    let mut request = HttpRequest::new(Method::GET, url);
    request
        .headers
        .insert("accept", HeaderValue::from_static("application/json"));

    let response = transport
        .execute(request)
        .await
        .map_err(|e| Error::Transport(e.to_string()))?;

    if !response.is_success() {
        return Err(Error::Rejected {
            status: response.status,
            body: response.body,
        });
    }

    let parsed: TokenResponse = serde_json::from_str(&response.body)
        .map_err(|e| Error::Malformed(format!("invalid token response: {e}")))?;
    if parsed.csrf_token.is_empty() {
        return Err(Error::Malformed("empty csrf_token".into()));
    }
    Ok(CsrfToken::new(parsed.csrf_token))
}
