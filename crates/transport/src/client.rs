//! reqwest-backed transport
//!
//! The client keeps a cookie store: the backend binds CSRF tokens to the
//! session cookie, so the token fetch and the guarded request must travel
//! on the same cookie jar.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::debug;

use crate::{HttpRequest, HttpResponse, Result, Transport, TransportError};

/// Settings for building the underlying `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: None,
        }
    }
}

/// Production transport over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client with a cookie store, request timeout, and optional
    /// User-Agent.
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.timeout);
        if let Some(ref ua) = config.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing client (caller owns cookie/timeout settings).
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn id(&self) -> &str {
        "reqwest"
    }

    fn execute(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + '_>> {
        Box::pin(async move {
            let HttpRequest {
                method,
                url,
                headers,
                body,
            } = request;

            let mut builder = self.client.request(method, &url).headers(headers);
            if let Some(body) = body {
                builder = builder.body(body);
            }

            let response = builder.send().await.map_err(map_send_error)?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| TransportError::Body(e.to_string()))?;

            debug!(url = %url, status, bytes = body.len(), "response received");
            Ok(HttpResponse { status, body })
        })
    }
}

fn map_send_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    #[test]
    fn default_config_uses_thirty_second_timeout() {
        let config = TransportConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn builds_with_user_agent() {
        let config = TransportConfig {
            timeout: Duration::from_secs(5),
            user_agent: Some("chat-client/0.1".into()),
        };
        let transport = ReqwestTransport::new(&config).unwrap();
        assert_eq!(transport.id(), "reqwest");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        // Port 9 on localhost (discard) is closed in test environments
        let transport = ReqwestTransport::new(&TransportConfig {
            timeout: Duration::from_secs(2),
            user_agent: None,
        })
        .unwrap();
        let result = transport
            .execute(HttpRequest::new(Method::GET, "http://127.0.0.1:9/api/csrf-token"))
            .await;
        assert!(result.is_err(), "closed port must not yield a response");
    }
}
