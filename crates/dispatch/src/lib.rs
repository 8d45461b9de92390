//! CSRF-aware request dispatch for the chat API
//!
//! All API calls go through `Dispatcher::send`, which resolves the URL,
//! attaches a CSRF token to mutating requests, recovers once from a stale
//! token, and classifies every failure into a stable `ClassifiedError`.
//! `ApiClient` layers user notification on top.
//!
//! Request lifecycle:
//! 1. Caller builds `RequestOptions` (method, headers, body, flags)
//! 2. POST/PUT/PATCH/DELETE get a token from the shared `csrf::TokenCache`
//! 3. Transport sends the request
//! 4. 403 with a CSRF `detail` → refresh token, resend once
//! 5. Anything else non-2xx → `classify::classify`, no retry
//! 6. `ApiClient` notifies once per terminal failure

pub mod classify;
pub mod dispatcher;
pub mod error;
pub mod notify;
pub mod options;

pub use classify::{classify, is_csrf_rejection};
pub use dispatcher::{Dispatcher, resolve_url};
pub use error::{ClassifiedError, ErrorKind, ErrorStatus};
pub use notify::{ApiClient, Notifier, Severity};
pub use options::{RequestOptions, is_mutating};
