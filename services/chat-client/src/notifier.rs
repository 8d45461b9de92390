//! Notification sink for the CLI: user messages become log events.

use dispatch::{Notifier, Severity};
use tracing::{error, info, warn};

pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Error => error!(notification = severity.label(), "{message}"),
            Severity::Warning => warn!(notification = severity.label(), "{message}"),
            Severity::Success | Severity::Info => {
                info!(notification = severity.label(), "{message}")
            }
        }
    }
}
