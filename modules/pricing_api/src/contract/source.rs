use async_trait::async_trait;
use query_core::{Page, PageRequest, SortSpec};

use crate::contract::error::SourceError;
use crate::contract::model::{
    ConfidenceSummary, CoverageSummary, ForecastFilter, ForecastRow, ForecastRunSummary,
    GuardrailSummary, PolicySummary, PricingFilter, PricingRow, PricingRunSummary, ReasonCode,
    ReasonCodeFilter, TimeWindow, Zone, ZoneFilter,
};

pub const PRICING_SORT_FIELDS: &[&str] = &[
    "bucket_start_ts",
    "zone_id",
    "final_multiplier",
    "raw_multiplier",
    "confidence_score",
    "borough",
];
pub const FORECAST_SORT_FIELDS: &[&str] = &[
    "bucket_start_ts",
    "zone_id",
    "y_pred",
    "confidence_score",
    "borough",
];
pub const ZONE_SORT_FIELDS: &[&str] = &["zone_id", "zone_name", "borough"];
pub const REASON_CODE_SORT_FIELDS: &[&str] = &["reason_code", "category", "active_flag"];

pub const ZONE_DEFAULT_SORT: &str = "zone_id:asc";
pub const REASON_CODE_DEFAULT_SORT: &str = "reason_code:asc";

/// Validated paging window and ordering handed to a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    pub page: PageRequest,
    pub sort: SortSpec,
}

/// Time-bucketed record store (pricing decisions or demand forecasts).
///
/// Every listing is scoped to the latest run. When no run exists the
/// source returns an empty page carrying a warning instead of failing.
#[async_trait]
pub trait RecordSource<R, S, F>: Send + Sync {
    async fn get_latest(&self, filter: &F, slice: &Slice) -> Result<Page<R>, SourceError>;

    async fn get_window(
        &self,
        window: &TimeWindow,
        filter: &F,
        slice: &Slice,
    ) -> Result<Page<R>, SourceError>;

    /// Fails with [`SourceError::ZoneNotFound`] when the zone is unknown.
    async fn get_zone_timeline(
        &self,
        zone_id: i64,
        window: &TimeWindow,
        slice: &Slice,
    ) -> Result<Page<R>, SourceError>;

    /// Newest run-log entry by start time, whatever its status.
    async fn get_latest_run_summary(&self) -> Result<Option<S>, SourceError>;

    async fn get_run_summary(&self, run_id: &str) -> Result<Option<S>, SourceError>;
}

pub type PricingSource = dyn RecordSource<PricingRow, PricingRunSummary, PricingFilter>;
pub type ForecastSource = dyn RecordSource<ForecastRow, ForecastRunSummary, ForecastFilter>;

#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn zones(&self, filter: &ZoneFilter, slice: &Slice) -> Result<Page<Zone>, SourceError>;

    async fn reason_codes(
        &self,
        filter: &ReasonCodeFilter,
        slice: &Slice,
    ) -> Result<Page<ReasonCode>, SourceError>;

    async fn current_policy(&self) -> Result<Option<PolicySummary>, SourceError>;
}

#[async_trait]
pub trait DiagnosticsSource: Send + Sync {
    async fn coverage(&self) -> Result<CoverageSummary, SourceError>;

    async fn guardrails(&self) -> Result<GuardrailSummary, SourceError>;

    async fn confidence(&self) -> Result<ConfidenceSummary, SourceError>;
}
