//! User notification seam and the notifying client
//!
//! `Dispatcher` returns classified results and never talks to the user.
//! `ApiClient` is the thin adapter that turns a terminal failure into exactly
//! one notification, unless the caller opted out with `skip_error_toast`.

use std::sync::Arc;

use serde_json::Value;

use crate::dispatcher::{Dispatcher, Result};
use crate::options::RequestOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

/// Fire-and-forget sink for user-facing messages (a toast area, a log, ...).
pub trait Notifier: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);
}

/// Dispatcher plus notification policy: what CRUD wrappers call.
pub struct ApiClient {
    dispatcher: Dispatcher,
    notifier: Arc<dyn Notifier>,
}

impl ApiClient {
    pub fn new(dispatcher: Dispatcher, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            dispatcher,
            notifier,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Dispatch, then notify once on terminal failure.
    ///
    /// The notification text is `custom_error_message` when set, otherwise the
    /// classified message. The returned error is the classified error either
    /// way. Successes (including ones that needed the CSRF retry) are silent.
    pub async fn send(&self, endpoint: &str, options: RequestOptions) -> Result<Option<Value>> {
        let outcome = self.dispatcher.send(endpoint, &options).await;
        if let Err(ref err) = outcome
            && !options.skip_error_toast
        {
            let message = options
                .custom_error_message
                .as_deref()
                .unwrap_or(&err.message);
            self.notifier.notify(Severity::Error, message);
        }
        outcome
    }
}
