//! Liveness and store-reachability reporting.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::time;

use crate::observability::metrics;
use crate::store::ConfigRepository;

/// Answer to a probe request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// Always true once the process can respond at all.
    pub alive: bool,
    /// Whether a trivial round trip to the store succeeded in time.
    #[serde(rename = "db_connected")]
    pub store_reachable: bool,
}

pub struct HealthReporter {
    repository: Arc<dyn ConfigRepository>,
    probe_timeout: Duration,
}

impl HealthReporter {
    pub fn new(repository: Arc<dyn ConfigRepository>, probe_timeout: Duration) -> Self {
        Self {
            repository,
            probe_timeout,
        }
    }

    /// Probe the store. A failed probe is reported, never propagated.
    pub async fn check(&self) -> HealthReport {
        let start = Instant::now();

        let store_reachable = match time::timeout(self.probe_timeout, self.repository.ping()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Store probe failed");
                false
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.probe_timeout, "Store probe timed out");
                false
            }
        };

        tracing::debug!(
            store_reachable,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Health check completed"
        );
        metrics::record_store_probe(store_reachable);

        HealthReport {
            alive: true,
            store_reachable,
        }
    }
}
