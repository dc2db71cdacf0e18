//! Prometheus metrics.

use crate::{Error, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::{Deserialize, Serialize};

/// Metrics configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Whether metrics are recorded and served at `/metrics`.
    pub enabled: bool,
}

/// Installs the global Prometheus recorder.
///
/// Returns `None` when metrics are disabled. The handle renders the text
/// exposition for the UI's `/metrics` route.
///
/// # Errors
///
/// Returns an error if a recorder is already installed.
pub fn install_prometheus(config: MetricsConfig) -> Result<Option<PrometheusHandle>> {
    if !config.enabled {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::operation("metrics_recorder_install", e))?;
    tracing::debug!("Installed Prometheus recorder");
    Ok(Some(handle))
}
