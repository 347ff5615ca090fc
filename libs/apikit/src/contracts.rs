use async_trait::async_trait;
use serde::Serialize;

/// Outcome of a readiness probe against the backing data sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReadinessReport {
    pub db_connected: bool,
    pub pricing_source_ready: bool,
    pub forecast_source_ready: bool,
}

impl ReadinessReport {
    pub fn ready(&self) -> bool {
        self.db_connected && self.pricing_source_ready && self.forecast_source_ready
    }
}

/// Implemented by whatever backs the API so `/ready` can report on it.
/// Probes must not fail: unreachable backends are reported as `false`.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn readiness(&self) -> ReadinessReport;
}
