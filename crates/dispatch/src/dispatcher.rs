//! Request dispatch with CSRF attachment and one-shot CSRF retry
//!
//! Per logical call:
//!
//! ```text
//! Initial ─send─> Sent ─2xx──────────────> Success
//!                  │ ─other failure──────> Failed
//!                  └─403 CSRF (gated)──> CsrfRetry ─refresh+send─> RetrySent ─2xx─> Success
//!                                                                   └─any failure─> Failed
//! ```
//!
//! The retry branch is taken at most once, tracked by `Attempt`. Nothing else
//! is retried: network errors, 5xx and ordinary 4xx are terminal.
//!
//! The dispatcher has no side effects beyond the network and logging/metrics;
//! user notification is layered on top by `ApiClient`.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};
use transport::{HeaderName, HttpRequest, HttpResponse, Transport, header};
use uuid::Uuid;

use csrf::{CSRF_HEADER, CsrfToken, TokenCache};

use crate::classify;
use crate::error::{ClassifiedError, ErrorKind};
use crate::options::RequestOptions;

/// Result of a dispatched call: the parsed body, or `None` for an empty
/// success (e.g. 204).
pub type Result<T> = std::result::Result<T, ClassifiedError>;

/// Retry bookkeeping for one logical call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Initial,
    Retried,
}

/// Sends API requests, attaching and recovering CSRF tokens as needed.
pub struct Dispatcher {
    base_url: String,
    transport: Arc<dyn Transport>,
    tokens: TokenCache,
}

impl Dispatcher {
    /// Create a dispatcher with its own token cache on the same transport.
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let tokens = TokenCache::new(Arc::clone(&transport), &base_url);
        Self::with_token_cache(transport, base_url, tokens)
    }

    /// Create a dispatcher sharing an existing token cache.
    pub fn with_token_cache(
        transport: Arc<dyn Transport>,
        base_url: impl Into<String>,
        tokens: TokenCache,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    /// Send `options` to `endpoint` and classify the outcome.
    ///
    /// `endpoint` is either an absolute URL or a path appended verbatim to the
    /// base URL.
    #[instrument(
        skip_all,
        fields(
            request_id = %Uuid::new_v4(),
            method = %options.method,
            endpoint = %endpoint,
            transport = self.transport.id(),
        )
    )]
    pub async fn send(&self, endpoint: &str, options: &RequestOptions) -> Result<Option<Value>> {
        let outcome = self.send_inner(endpoint, options).await;
        let label = match &outcome {
            Ok(_) => "success",
            Err(e) => e.kind.label(),
        };
        metrics::counter!(
            "api_requests_total",
            "method" => options.method.to_string(),
            "outcome" => label
        )
        .increment(1);
        outcome
    }

    async fn send_inner(&self, endpoint: &str, options: &RequestOptions) -> Result<Option<Value>> {
        let url = resolve_url(&self.base_url, endpoint);
        let gated = options.requires_csrf();

        let mut token = if gated {
            Some(self.tokens.get_token().await.map_err(|e| {
                warn!(error = %e, "csrf token unavailable, request not sent");
                classify::csrf_unavailable(&e)
            })?)
        } else {
            None
        };

        let mut attempt = Attempt::Initial;
        loop {
            let request = build_request(&url, options, token.as_ref())?;
            let response = self.transport.execute(request).await.map_err(|e| {
                warn!(error = %e, "no response from server");
                classify::network_error()
            })?;

            if response.is_success() {
                debug!(status = response.status, "request succeeded");
                return Ok(parse_success_body(&response));
            }

            let body = classify::parse_error_body(&response.body);
            if gated && classify::is_csrf_rejection(response.status, &body) {
                match attempt {
                    Attempt::Initial => {
                        warn!("csrf token rejected, refreshing and retrying once");
                        metrics::counter!("api_csrf_retries_total").increment(1);
                        attempt = Attempt::Retried;
                        let fresh = self.tokens.refresh_token().await.map_err(|e| {
                            warn!(error = %e, "csrf token refresh failed");
                            classify::csrf_unavailable(&e)
                        })?;
                        token = Some(fresh);
                        continue;
                    }
                    Attempt::Retried => {
                        let mut err = classify::classify(response.status, &body);
                        err.kind = ErrorKind::CsrfRejected;
                        warn!(status = response.status, "csrf token rejected after refresh");
                        return Err(err);
                    }
                }
            }

            let err = classify::classify(response.status, &body);
            warn!(
                status = response.status,
                kind = err.kind.label(),
                retried = attempt == Attempt::Retried,
                "request failed"
            );
            return Err(err);
        }
    }
}

/// Absolute URLs (`scheme://...`) pass through; anything else is appended to
/// `base_url` as-is, with no slash normalization.
pub fn resolve_url(base_url: &str, endpoint: &str) -> String {
    if has_scheme(endpoint) {
        endpoint.to_string()
    } else {
        format!("{base_url}{endpoint}")
    }
}

fn has_scheme(endpoint: &str) -> bool {
    match endpoint.split_once("://") {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Caller headers, plus `content-type: application/json` when a body is sent
/// without one, plus the CSRF header (which overrides a caller-supplied one).
fn build_request(
    url: &str,
    options: &RequestOptions,
    token: Option<&CsrfToken>,
) -> Result<HttpRequest> {
    let mut request = HttpRequest::new(options.method.clone(), url);
    request.headers = options.headers.clone();
    request.body = options.body.clone();

    if request.body.is_some() && !request.headers.contains_key(header::CONTENT_TYPE) {
        request.headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
    }

    if let Some(token) = token {
        let value = token.header_value().map_err(|e| {
            warn!(error = %e, "csrf token cannot be sent as a header");
            classify::csrf_unavailable(&e)
        })?;
        request
            .headers
            .insert(HeaderName::from_static(CSRF_HEADER), value);
    }
    Ok(request)
}

/// Empty bodies and 204 are `None`; JSON is parsed; anything else is handed
/// back as a JSON string.
fn parse_success_body(response: &HttpResponse) -> Option<Value> {
    if response.status == 204 || response.body.trim().is_empty() {
        return None;
    }
    Some(
        serde_json::from_str(&response.body)
            .unwrap_or_else(|_| Value::String(response.body.clone())),
    )
}
