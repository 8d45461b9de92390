//! Per-call request options

use serde::Serialize;
use transport::{HeaderMap, HeaderName, HeaderValue, Method};

/// What a caller asks `send` to do.
///
/// Defaults to a plain GET with no body, CSRF handling on, and error
/// notifications on.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
    /// Do not attach (or fetch) a CSRF token even for mutating methods
    pub skip_csrf: bool,
    /// Do not notify on terminal failure
    pub skip_error_toast: bool,
    /// Notification text to use instead of the classified message
    pub custom_error_message: Option<String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            body: None,
            skip_csrf: false,
            skip_error_toast: false,
            custom_error_message: None,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Raw body, sent verbatim.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set `content-type`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> serde_json::Result<Self> {
        self.body = Some(serde_json::to_string(value)?);
        self.headers.insert(
            transport::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Ok(self)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn skip_csrf(mut self) -> Self {
        self.skip_csrf = true;
        self
    }

    pub fn skip_error_toast(mut self) -> Self {
        self.skip_error_toast = true;
        self
    }

    pub fn custom_error_message(mut self, message: impl Into<String>) -> Self {
        self.custom_error_message = Some(message.into());
        self
    }

    /// Whether this call must carry a CSRF token.
    pub fn requires_csrf(&self) -> bool {
        is_mutating(&self.method) && !self.skip_csrf
    }
}

/// POST, PUT, PATCH and DELETE change server state; everything else is safe.
pub fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
