//! CSRF token lifecycle for the chat API client
//!
//! Every mutating API call carries an anti-CSRF token in the `X-CSRF-Token`
//! header. This crate owns that token:
//!
//! 1. `TokenCache::get_token()` returns the cached token or fetches one from
//!    `GET {base}/api/csrf-token`; concurrent callers share a single fetch
//! 2. On a CSRF rejection the dispatcher calls `TokenCache::refresh_token()`
//!    to force a new fetch and retries once
//! 3. `TokenCache::clear_cache()` drops everything (e.g. after logout)
//!
//! The token is kept behind `common::Secret` and never logged.

pub mod cache;
pub mod constants;
pub mod error;
pub mod token;

pub use cache::TokenCache;
pub use constants::*;
pub use error::{Error, Result};
pub use token::{CsrfToken, TokenResponse, fetch_token};
