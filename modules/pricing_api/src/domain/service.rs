use std::sync::Arc;

use query_core::{normalize, parse_sort, Page, PageLimits};
use tracing::{debug, info};

use apikit::VersionInfo;

use crate::contract::model::{
    ConfidenceSummary, CoverageSummary, ForecastFilter, ForecastRow, ForecastRunSummary,
    GuardrailSummary, PolicySummary, PricingFilter, PricingRow, PricingRunSummary, ReasonCode,
    ReasonCodeFilter, TimeWindow, Zone, ZoneFilter,
};
use crate::contract::source::{
    DiagnosticsSource, ForecastSource, MetadataSource, PricingSource, RecordSource, Slice,
};
use crate::domain::catalog::{self, SchemaCatalog};
use crate::domain::error::DomainError;
use crate::domain::plain_language::{Annotate, AnnotationPolicy};
use crate::domain::view::RowView;

/// Runtime knobs of the service layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub limits: PageLimits,
    /// Default ordering of pricing and forecast listings.
    pub default_sort: String,
    pub include_plain_language_fields: bool,
    pub annotation: AnnotationPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            limits: PageLimits::default(),
            default_sort: "bucket_start_ts:desc".to_string(),
            include_plain_language_fields: true,
            annotation: AnnotationPolicy::default(),
        }
    }
}

/// Raw, unvalidated paging inputs of a list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paging {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
}

/// The data sources backing the service.
#[derive(Clone)]
pub struct Sources {
    pub pricing: Arc<PricingSource>,
    pub forecast: Arc<ForecastSource>,
    pub metadata: Arc<dyn MetadataSource>,
    pub diagnostics: Arc<dyn DiagnosticsSource>,
}

impl Sources {
    /// All four roles served by one store.
    pub fn shared<T>(store: Arc<T>) -> Self
    where
        T: RecordSource<PricingRow, PricingRunSummary, PricingFilter>
            + RecordSource<ForecastRow, ForecastRunSummary, ForecastFilter>
            + MetadataSource
            + DiagnosticsSource
            + 'static,
    {
        Self {
            pricing: store.clone(),
            forecast: store.clone(),
            metadata: store.clone(),
            diagnostics: store,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Pricing,
    Forecast,
}

impl RecordKind {
    fn label(self) -> &'static str {
        match self {
            RecordKind::Pricing => "pricing",
            RecordKind::Forecast => "forecast",
        }
    }

    fn title(self) -> &'static str {
        match self {
            RecordKind::Pricing => "Pricing",
            RecordKind::Forecast => "Forecast",
        }
    }
}

/// Read operations over one time-bucketed record kind.
pub struct Records<R, S, F> {
    source: Arc<dyn RecordSource<R, S, F>>,
    kind: RecordKind,
    policy: AnnotationPolicy,
}

impl<R, S, F> Records<R, S, F>
where
    R: Annotate + Send,
    S: Send,
    F: Sync,
{
    pub fn new(
        source: Arc<dyn RecordSource<R, S, F>>,
        kind: RecordKind,
        policy: AnnotationPolicy,
    ) -> Self {
        Self {
            source,
            kind,
            policy,
        }
    }

    pub async fn latest(
        &self,
        filter: &F,
        slice: &Slice,
        annotate: bool,
    ) -> Result<Page<RowView<R, R::Notes>>, DomainError> {
        debug!(kind = self.kind.label(), sort = %slice.sort, "listing latest rows");
        let page = self.source.get_latest(filter, slice).await?;
        Ok(self.present(page, annotate))
    }

    pub async fn window(
        &self,
        window: &TimeWindow,
        filter: &F,
        slice: &Slice,
        annotate: bool,
    ) -> Result<Page<RowView<R, R::Notes>>, DomainError> {
        ensure_ordered(window)?;
        debug!(kind = self.kind.label(), ?window, "listing window");
        let page = self.source.get_window(window, filter, slice).await?;
        Ok(self.present(page, annotate))
    }

    pub async fn zone_timeline(
        &self,
        zone_id: i64,
        window: &TimeWindow,
        slice: &Slice,
        annotate: bool,
    ) -> Result<Page<RowView<R, R::Notes>>, DomainError> {
        ensure_ordered(window)?;
        debug!(kind = self.kind.label(), zone_id, "listing zone timeline");
        let page = self
            .source
            .get_zone_timeline(zone_id, window, slice)
            .await?;
        Ok(self.present(page, annotate))
    }

    pub async fn latest_run(&self) -> Result<S, DomainError> {
        self.source.get_latest_run_summary().await?.ok_or_else(|| {
            DomainError::run_not_found(format!(
                "No {} run metadata found.",
                self.kind.label()
            ))
        })
    }

    pub async fn run(&self, run_id: &str) -> Result<S, DomainError> {
        self.source.get_run_summary(run_id).await?.ok_or_else(|| {
            DomainError::run_not_found(format!("{} run_id not found: {run_id}", self.kind.title()))
        })
    }

    fn present(&self, page: Page<R>, annotate: bool) -> Page<RowView<R, R::Notes>> {
        let policy = annotate.then_some(&self.policy);
        page.map_items(|row| RowView::build(row, policy))
    }
}

fn ensure_ordered(window: &TimeWindow) -> Result<(), DomainError> {
    if window.is_inverted() {
        return Err(DomainError::invalid_time_window(
            "start_ts must be less than or equal to end_ts.",
        ));
    }
    Ok(())
}

/// Domain service behind every endpoint.
pub struct Service {
    pub pricing: Records<PricingRow, PricingRunSummary, PricingFilter>,
    pub forecast: Records<ForecastRow, ForecastRunSummary, ForecastFilter>,
    metadata: Arc<dyn MetadataSource>,
    diagnostics: Arc<dyn DiagnosticsSource>,
    config: ServiceConfig,
    version: VersionInfo,
}

impl Service {
    pub fn new(sources: Sources, config: ServiceConfig, version: VersionInfo) -> Self {
        info!(
            api_version = %version.api_version,
            schema_version = %version.schema_version,
            plain_language = config.include_plain_language_fields,
            "pricing service initialized"
        );
        Self {
            pricing: Records::new(sources.pricing, RecordKind::Pricing, config.annotation),
            forecast: Records::new(sources.forecast, RecordKind::Forecast, config.annotation),
            metadata: sources.metadata,
            diagnostics: sources.diagnostics,
            config,
            version,
        }
    }

    pub fn version(&self) -> &VersionInfo {
        &self.version
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Validates paging and sort. `default_sort` falls back to the
    /// configured pricing/forecast default.
    pub fn slice(
        &self,
        paging: &Paging,
        allowed_fields: &[&str],
        default_sort: Option<&str>,
    ) -> Result<Slice, DomainError> {
        let page = normalize(
            paging.page,
            paging.page_size,
            paging.limit,
            self.config.limits,
        )?;
        let sort = parse_sort(
            paging.sort.as_deref(),
            default_sort.unwrap_or(&self.config.default_sort),
            allowed_fields,
        )?;
        Ok(Slice { page, sort })
    }

    /// Per-request override of the plain-language toggle.
    pub fn annotate(&self, requested: Option<bool>) -> bool {
        requested.unwrap_or(self.config.include_plain_language_fields)
    }

    pub async fn zones(
        &self,
        filter: &ZoneFilter,
        slice: &Slice,
    ) -> Result<Page<Zone>, DomainError> {
        Ok(self.metadata.zones(filter, slice).await?)
    }

    pub async fn reason_codes(
        &self,
        filter: &ReasonCodeFilter,
        slice: &Slice,
    ) -> Result<Page<ReasonCode>, DomainError> {
        Ok(self.metadata.reason_codes(filter, slice).await?)
    }

    pub async fn current_policy(&self) -> Result<PolicySummary, DomainError> {
        Ok(self.metadata.current_policy().await?.unwrap_or_default())
    }

    pub fn schema_catalog(&self) -> SchemaCatalog {
        catalog::schema_catalog(&self.version)
    }

    pub async fn coverage(&self) -> Result<CoverageSummary, DomainError> {
        Ok(self.diagnostics.coverage().await?)
    }

    pub async fn guardrails(&self) -> Result<GuardrailSummary, DomainError> {
        Ok(self.diagnostics.guardrails().await?.with_rates())
    }

    pub async fn confidence(&self) -> Result<ConfidenceSummary, DomainError> {
        Ok(self.diagnostics.confidence().await?)
    }
}
