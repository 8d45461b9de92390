//! Prometheus rendering of client-side counters
//!
//! The library crates emit through the `metrics` facade:
//!
//! - `api_requests_total` (counter): labels `method`, `outcome`
//! - `api_csrf_retries_total` (counter)
//! - `csrf_token_fetches_total` (counter): label `outcome`
//!
//! With `--metrics` the CLI installs a recorder up front and prints the text
//! exposition once the command finishes.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")
}
