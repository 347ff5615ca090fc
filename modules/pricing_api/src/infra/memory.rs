//! In-memory data source with the same semantics as the PostgreSQL store.
//!
//! Backs the integration tests and the server's `--mock` mode.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use query_core::{Page, SortOrder};

use apikit::{ReadinessProbe, ReadinessReport};

use crate::contract::error::SourceError;
use crate::contract::model::{
    ConfidenceBand, ConfidenceSummary, CoverageSummary, ForecastFilter, ForecastRow,
    ForecastRunSummary, GuardrailSummary, PolicySummary, PricingFilter, PricingRow,
    PricingRunSummary, ReasonCode, ReasonCodeFilter, RunRecord, TimeWindow, Zone, ZoneFilter,
};
use crate::contract::source::{DiagnosticsSource, MetadataSource, RecordSource, Slice};

/// Everything the store serves. Row vectors are in insertion order, which
/// stands in for the creation timestamp when no successful run is logged.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub pricing_rows: Vec<PricingRow>,
    pub pricing_runs: Vec<PricingRunSummary>,
    pub forecast_rows: Vec<ForecastRow>,
    pub forecast_runs: Vec<ForecastRunSummary>,
    pub zones: Vec<Zone>,
    pub reason_codes: Vec<ReasonCode>,
    pub policies: Vec<PolicySummary>,
}

pub struct InMemoryStore {
    data: Dataset,
}

impl InMemoryStore {
    pub fn new(data: Dataset) -> Self {
        Self { data }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.data
    }

    fn zone_exists(&self, zone_id: i64) -> bool {
        self.data.zones.iter().any(|z| z.zone_id == zone_id)
    }
}

// ---- sorting ----

enum SortKey<'a> {
    Int(i64),
    Float(f64),
    Time(DateTime<Utc>),
    Text(Option<&'a str>),
    Flag(bool),
}

/// Nulls sort after every value, as PostgreSQL does for ascending order.
fn compare_keys(a: &SortKey<'_>, b: &SortKey<'_>) -> Ordering {
    match (a, b) {
        (SortKey::Int(x), SortKey::Int(y)) => x.cmp(y),
        (SortKey::Float(x), SortKey::Float(y)) => x.total_cmp(y),
        (SortKey::Time(x), SortKey::Time(y)) => x.cmp(y),
        (SortKey::Flag(x), SortKey::Flag(y)) => x.cmp(y),
        (SortKey::Text(x), SortKey::Text(y)) => match (x, y) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        _ => Ordering::Equal,
    }
}

trait Sortable {
    fn sort_key(&self, field: &str) -> Option<SortKey<'_>>;

    /// Deterministic secondary ordering, always ascending.
    fn tie_break(&self, other: &Self) -> Ordering;
}

trait Bucketed: Sortable + Clone {
    fn zone_id(&self) -> i64;
    fn run_id(&self) -> &str;
}

impl Sortable for PricingRow {
    fn sort_key(&self, field: &str) -> Option<SortKey<'_>> {
        Some(match field {
            "zone_id" => SortKey::Int(self.zone_id),
            "bucket_start_ts" => SortKey::Time(self.bucket_start_ts),
            "final_multiplier" => SortKey::Float(self.final_multiplier),
            "raw_multiplier" => SortKey::Float(self.raw_multiplier),
            "confidence_score" => SortKey::Float(self.confidence_score),
            "borough" => SortKey::Text(self.borough.as_deref()),
            _ => return None,
        })
    }

    fn tie_break(&self, other: &Self) -> Ordering {
        (self.zone_id, self.bucket_start_ts).cmp(&(other.zone_id, other.bucket_start_ts))
    }
}

impl Bucketed for PricingRow {
    fn zone_id(&self) -> i64 {
        self.zone_id
    }
    fn run_id(&self) -> &str {
        &self.run_id
    }
}

impl Sortable for ForecastRow {
    fn sort_key(&self, field: &str) -> Option<SortKey<'_>> {
        Some(match field {
            "zone_id" => SortKey::Int(self.zone_id),
            "bucket_start_ts" => SortKey::Time(self.bucket_start_ts),
            "y_pred" => SortKey::Float(self.y_pred),
            "confidence_score" => SortKey::Float(self.confidence_score),
            "borough" => SortKey::Text(self.borough.as_deref()),
            _ => return None,
        })
    }

    fn tie_break(&self, other: &Self) -> Ordering {
        (self.zone_id, self.bucket_start_ts).cmp(&(other.zone_id, other.bucket_start_ts))
    }
}

impl Bucketed for ForecastRow {
    fn zone_id(&self) -> i64 {
        self.zone_id
    }
    fn run_id(&self) -> &str {
        &self.run_id
    }
}

impl Sortable for Zone {
    fn sort_key(&self, field: &str) -> Option<SortKey<'_>> {
        Some(match field {
            "zone_id" => SortKey::Int(self.zone_id),
            "zone_name" => SortKey::Text(Some(&self.zone_name)),
            "borough" => SortKey::Text(Some(&self.borough)),
            _ => return None,
        })
    }

    fn tie_break(&self, other: &Self) -> Ordering {
        self.zone_id.cmp(&other.zone_id)
    }
}

impl Sortable for ReasonCode {
    fn sort_key(&self, field: &str) -> Option<SortKey<'_>> {
        Some(match field {
            "reason_code" => SortKey::Text(Some(&self.reason_code)),
            "category" => SortKey::Text(Some(&self.category)),
            "active_flag" => SortKey::Flag(self.active_flag),
            _ => return None,
        })
    }

    fn tie_break(&self, other: &Self) -> Ordering {
        self.reason_code.cmp(&other.reason_code)
    }
}

/// Filter, order and cut one page out of `items`.
fn paginate<'a, T, I>(items: I, slice: &Slice) -> Result<Page<T>, SourceError>
where
    T: Sortable + Clone + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let field = slice.sort.field.as_str();
    let mut keyed = Vec::new();
    for item in items {
        let key = item
            .sort_key(field)
            .ok_or_else(|| SourceError::UnmappedSortField(field.to_string()))?;
        keyed.push((key, item));
    }

    keyed.sort_by(|(ka, a), (kb, b)| {
        let primary = compare_keys(ka, kb);
        let primary = match slice.sort.order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.tie_break(b))
    });

    let total_count = keyed.len() as u64;
    let offset = usize::try_from(slice.page.offset).unwrap_or(usize::MAX);
    let items = keyed
        .into_iter()
        .skip(offset)
        .take(slice.page.limit() as usize)
        .map(|(_, item)| item.clone())
        .collect();
    Ok(Page::new(items, total_count))
}

// ---- record sources ----

/// Newest successful run in the log, else the run of the newest row.
fn latest_run_id<'a, R: Bucketed, S: RunRecord>(runs: &'a [S], rows: &'a [R]) -> Option<&'a str> {
    runs.iter()
        .filter(|run| run.succeeded())
        .max_by_key(|run| run.started_at())
        .map(RunRecord::run_id)
        .or_else(|| rows.last().map(Bucketed::run_id))
}

fn newest_run<S: RunRecord + Clone>(runs: &[S]) -> Option<S> {
    runs.iter().max_by_key(|run| run.started_at()).cloned()
}

fn scoped_page<R: Bucketed, S: RunRecord>(
    rows: &[R],
    runs: &[S],
    no_run_warning: &str,
    keep: impl Fn(&R) -> bool,
    slice: &Slice,
) -> Result<Page<R>, SourceError> {
    let Some(run_id) = latest_run_id(runs, rows) else {
        return Ok(Page::empty_with_warning(no_run_warning));
    };
    paginate(
        rows.iter().filter(|row| row.run_id() == run_id && keep(row)),
        slice,
    )
}

const NO_PRICING_RUN: &str = "No pricing run found.";
const NO_FORECAST_RUN: &str = "No forecast run found.";

#[async_trait]
impl RecordSource<PricingRow, PricingRunSummary, PricingFilter> for InMemoryStore {
    async fn get_latest(
        &self,
        filter: &PricingFilter,
        slice: &Slice,
    ) -> Result<Page<PricingRow>, SourceError> {
        scoped_page(
            &self.data.pricing_rows,
            &self.data.pricing_runs,
            NO_PRICING_RUN,
            |row| filter.matches(row),
            slice,
        )
    }

    async fn get_window(
        &self,
        window: &TimeWindow,
        filter: &PricingFilter,
        slice: &Slice,
    ) -> Result<Page<PricingRow>, SourceError> {
        scoped_page(
            &self.data.pricing_rows,
            &self.data.pricing_runs,
            NO_PRICING_RUN,
            |row| window.contains(row.bucket_start_ts) && filter.matches(row),
            slice,
        )
    }

    async fn get_zone_timeline(
        &self,
        zone_id: i64,
        window: &TimeWindow,
        slice: &Slice,
    ) -> Result<Page<PricingRow>, SourceError> {
        if !self.zone_exists(zone_id) {
            return Err(SourceError::ZoneNotFound(zone_id));
        }
        scoped_page(
            &self.data.pricing_rows,
            &self.data.pricing_runs,
            NO_PRICING_RUN,
            |row| row.zone_id == zone_id && window.contains(row.bucket_start_ts),
            slice,
        )
    }

    async fn get_latest_run_summary(&self) -> Result<Option<PricingRunSummary>, SourceError> {
        Ok(newest_run(&self.data.pricing_runs))
    }

    async fn get_run_summary(
        &self,
        run_id: &str,
    ) -> Result<Option<PricingRunSummary>, SourceError> {
        Ok(self
            .data
            .pricing_runs
            .iter()
            .find(|run| run.run_id == run_id)
            .cloned())
    }
}

#[async_trait]
impl RecordSource<ForecastRow, ForecastRunSummary, ForecastFilter> for InMemoryStore {
    async fn get_latest(
        &self,
        filter: &ForecastFilter,
        slice: &Slice,
    ) -> Result<Page<ForecastRow>, SourceError> {
        scoped_page(
            &self.data.forecast_rows,
            &self.data.forecast_runs,
            NO_FORECAST_RUN,
            |row| filter.matches(row),
            slice,
        )
    }

    async fn get_window(
        &self,
        window: &TimeWindow,
        filter: &ForecastFilter,
        slice: &Slice,
    ) -> Result<Page<ForecastRow>, SourceError> {
        scoped_page(
            &self.data.forecast_rows,
            &self.data.forecast_runs,
            NO_FORECAST_RUN,
            |row| window.contains(row.bucket_start_ts) && filter.matches(row),
            slice,
        )
    }

    async fn get_zone_timeline(
        &self,
        zone_id: i64,
        window: &TimeWindow,
        slice: &Slice,
    ) -> Result<Page<ForecastRow>, SourceError> {
        if !self.zone_exists(zone_id) {
            return Err(SourceError::ZoneNotFound(zone_id));
        }
        scoped_page(
            &self.data.forecast_rows,
            &self.data.forecast_runs,
            NO_FORECAST_RUN,
            |row| row.zone_id == zone_id && window.contains(row.bucket_start_ts),
            slice,
        )
    }

    async fn get_latest_run_summary(&self) -> Result<Option<ForecastRunSummary>, SourceError> {
        Ok(newest_run(&self.data.forecast_runs))
    }

    async fn get_run_summary(
        &self,
        run_id: &str,
    ) -> Result<Option<ForecastRunSummary>, SourceError> {
        Ok(self
            .data
            .forecast_runs
            .iter()
            .find(|run| run.run_id == run_id)
            .cloned())
    }
}

#[async_trait]
impl MetadataSource for InMemoryStore {
    async fn zones(&self, filter: &ZoneFilter, slice: &Slice) -> Result<Page<Zone>, SourceError> {
        paginate(
            self.data.zones.iter().filter(|zone| filter.matches(zone)),
            slice,
        )
    }

    async fn reason_codes(
        &self,
        filter: &ReasonCodeFilter,
        slice: &Slice,
    ) -> Result<Page<ReasonCode>, SourceError> {
        paginate(
            self.data
                .reason_codes
                .iter()
                .filter(|code| filter.matches(code)),
            slice,
        )
    }

    async fn current_policy(&self) -> Result<Option<PolicySummary>, SourceError> {
        Ok(self
            .data
            .policies
            .iter()
            .filter(|p| p.active_flag == Some(true))
            .max_by_key(|p| p.effective_from)
            .cloned())
    }
}

#[async_trait]
impl DiagnosticsSource for InMemoryStore {
    async fn coverage(&self) -> Result<CoverageSummary, SourceError> {
        let pricing_run = latest_run_id(&self.data.pricing_runs, &self.data.pricing_rows);
        let forecast_run = latest_run_id(&self.data.forecast_runs, &self.data.forecast_rows);

        let (pricing_zone_count, pricing_row_count) =
            run_counts(&self.data.pricing_rows, pricing_run);
        let (forecast_zone_count, forecast_row_count) =
            run_counts(&self.data.forecast_rows, forecast_run);

        Ok(CoverageSummary {
            pricing_run_id: pricing_run.map(str::to_string),
            forecast_run_id: forecast_run.map(str::to_string),
            pricing_zone_count,
            forecast_zone_count,
            pricing_row_count,
            forecast_row_count,
        })
    }

    async fn guardrails(&self) -> Result<GuardrailSummary, SourceError> {
        let Some(run_id) = latest_run_id(&self.data.pricing_runs, &self.data.pricing_rows) else {
            return Ok(GuardrailSummary::default());
        };
        let mut summary = GuardrailSummary {
            pricing_run_id: Some(run_id.to_string()),
            ..Default::default()
        };
        for row in self.data.pricing_rows.iter().filter(|r| r.run_id == run_id) {
            summary.total_rows += 1;
            summary.cap_applied_rows += u64::from(row.cap_applied);
            summary.rate_limited_rows += u64::from(row.rate_limit_applied);
            summary.smoothing_applied_rows += u64::from(row.smoothing_applied);
        }
        Ok(summary.with_rates())
    }

    async fn confidence(&self) -> Result<ConfidenceSummary, SourceError> {
        let Some(run_id) = latest_run_id(&self.data.forecast_runs, &self.data.forecast_rows)
        else {
            return Ok(ConfidenceSummary::default());
        };
        let mut bands: BTreeMap<&str, (u64, f64)> = BTreeMap::new();
        for row in self.data.forecast_rows.iter().filter(|r| r.run_id == run_id) {
            let entry = bands.entry(row.uncertainty_band.as_str()).or_default();
            entry.0 += 1;
            entry.1 += row.confidence_score;
        }
        Ok(ConfidenceSummary {
            forecast_run_id: Some(run_id.to_string()),
            bands: bands
                .into_iter()
                .map(|(band, (count, sum))| ConfidenceBand {
                    uncertainty_band: band.to_string(),
                    row_count: count,
                    avg_confidence_score: sum / count as f64,
                })
                .collect(),
        })
    }
}

fn run_counts<R: Bucketed>(rows: &[R], run_id: Option<&str>) -> (u64, u64) {
    let Some(run_id) = run_id else {
        return (0, 0);
    };
    let in_run: Vec<&R> = rows.iter().filter(|r| r.run_id() == run_id).collect();
    let zones: HashSet<i64> = in_run.iter().map(|r| r.zone_id()).collect();
    (zones.len() as u64, in_run.len() as u64)
}

#[async_trait]
impl ReadinessProbe for InMemoryStore {
    async fn readiness(&self) -> ReadinessReport {
        ReadinessReport {
            db_connected: true,
            pricing_source_ready: true,
            forecast_source_ready: true,
        }
    }
}

// ---- demo data ----

impl Dataset {
    /// Small deterministic dataset for `--mock` runs: three zones, one
    /// successful run of each kind, four 15-minute buckets per zone.
    pub fn sample() -> Self {
        let origin = Utc.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).single().unwrap_or_default();
        let zones = vec![
            sample_zone(132, "JFK Airport", "Queens", Some("Airports")),
            sample_zone(161, "Midtown Center", "Manhattan", Some("Yellow Zone")),
            sample_zone(181, "Park Slope", "Brooklyn", Some("Boro Zone")),
        ];
        let pricing_run_id = "pricing-2025-01-06T08";
        let forecast_run_id = "forecast-2025-01-06T08";

        let mut pricing_rows = Vec::new();
        let mut forecast_rows = Vec::new();
        for (zi, zone) in zones.iter().enumerate() {
            for step in 0..4i64 {
                let bucket = origin + Duration::minutes(15 * step);
                let y_pred = 4.0 + 7.5 * zi as f64 + 2.0 * step as f64;
                let multiplier = 1.0 + 0.06 * (zi as f64) + 0.03 * step as f64;
                let capped = multiplier > 1.2;
                let band = ["low", "medium", "high"][zi];
                let confidence = 0.9 - 0.2 * zi as f64;

                forecast_rows.push(ForecastRow {
                    zone_id: zone.zone_id,
                    bucket_start_ts: bucket,
                    forecast_run_key: format!("{forecast_run_id}:{}", zone.zone_id),
                    run_id: forecast_run_id.to_string(),
                    horizon_index: step + 1,
                    zone_name: Some(zone.zone_name.clone()),
                    borough: Some(zone.borough.clone()),
                    service_zone: zone.service_zone.clone(),
                    y_pred,
                    y_pred_lower: y_pred * 0.8,
                    y_pred_upper: y_pred * 1.2,
                    confidence_score: confidence,
                    uncertainty_band: band.to_string(),
                    used_recursive_features: step > 0,
                    model_name: "gbm_demand".to_string(),
                    model_version: "3".to_string(),
                    model_stage: "Production".to_string(),
                    feature_version: "v2".to_string(),
                });

                pricing_rows.push(PricingRow {
                    zone_id: zone.zone_id,
                    bucket_start_ts: bucket,
                    pricing_run_key: format!("{pricing_run_id}:{}", zone.zone_id),
                    run_id: pricing_run_id.to_string(),
                    forecast_run_id: forecast_run_id.to_string(),
                    zone_name: Some(zone.zone_name.clone()),
                    borough: Some(zone.borough.clone()),
                    service_zone: zone.service_zone.clone(),
                    final_multiplier: multiplier.min(1.2),
                    raw_multiplier: multiplier,
                    pre_cap_multiplier: multiplier,
                    post_cap_multiplier: multiplier.min(1.2),
                    confidence_score: confidence,
                    uncertainty_band: band.to_string(),
                    y_pred,
                    y_pred_lower: y_pred * 0.8,
                    y_pred_upper: y_pred * 1.2,
                    cap_applied: capped,
                    cap_type: capped.then(|| "max_multiplier".to_string()),
                    cap_reason: capped.then(|| "surge_ceiling".to_string()),
                    rate_limit_applied: step == 3,
                    rate_limit_direction: if step == 3 { "up" } else { "none" }.to_string(),
                    smoothing_applied: step > 1,
                    primary_reason_code: if capped { "CAP_APPLIED" } else { "DEMAND_UP" }
                        .to_string(),
                    reason_codes: vec!["DEMAND_UP".to_string()],
                    reason_summary: "Forecast demand is above the zone baseline.".to_string(),
                    pricing_policy_version: "policy-v1".to_string(),
                });
            }
        }

        let ended = origin + Duration::seconds(42);
        Dataset {
            pricing_runs: vec![PricingRunSummary {
                run_id: pricing_run_id.to_string(),
                status: "success".to_string(),
                started_at: Some(origin),
                ended_at: Some(ended),
                failure_reason: None,
                pricing_policy_version: Some("policy-v1".to_string()),
                forecast_run_id: Some(forecast_run_id.to_string()),
                target_bucket_start: Some(origin),
                target_bucket_end: Some(origin + Duration::minutes(45)),
                zone_count: Some(zones.len() as i64),
                row_count: Some(pricing_rows.len() as i64),
                cap_applied_count: Some(
                    pricing_rows.iter().filter(|r| r.cap_applied).count() as i64,
                ),
                rate_limited_count: Some(
                    pricing_rows.iter().filter(|r| r.rate_limit_applied).count() as i64,
                ),
                low_confidence_count: Some(
                    pricing_rows.iter().filter(|r| r.confidence_score < 0.5).count() as i64,
                ),
                latency_ms: Some(42_000.0),
            }],
            forecast_runs: vec![ForecastRunSummary {
                run_id: forecast_run_id.to_string(),
                status: "success".to_string(),
                started_at: Some(origin - Duration::minutes(5)),
                ended_at: Some(origin - Duration::minutes(4)),
                failure_reason: None,
                model_name: Some("gbm_demand".to_string()),
                model_version: Some("3".to_string()),
                model_stage: Some("Production".to_string()),
                feature_version: Some("v2".to_string()),
                forecast_run_key: Some(forecast_run_id.to_string()),
                forecast_start_ts: Some(origin),
                forecast_end_ts: Some(origin + Duration::minutes(45)),
                horizon_buckets: Some(4),
                bucket_minutes: Some(15),
                zone_count: Some(zones.len() as i64),
                row_count: Some(forecast_rows.len() as i64),
                latency_ms: Some(60_000.0),
            }],
            pricing_rows,
            forecast_rows,
            reason_codes: vec![
                sample_reason(
                    "CAP_APPLIED",
                    "guardrail",
                    "Multiplier capped by policy ceiling.",
                    true,
                ),
                sample_reason("DEMAND_UP", "demand", "Forecast demand above baseline.", true),
                sample_reason("LEGACY_SURGE", "demand", "Retired surge rule.", false),
            ],
            policies: vec![PolicySummary {
                policy_version: Some("policy-v1".to_string()),
                effective_from: Some(origin - Duration::days(30)),
                active_flag: Some(true),
                policy_summary: Some(serde_json::json!({
                    "max_multiplier": 1.2,
                    "max_step_change": 0.1,
                })),
            }],
            zones,
        }
    }
}

fn sample_zone(zone_id: i64, name: &str, borough: &str, service_zone: Option<&str>) -> Zone {
    Zone {
        zone_id,
        zone_name: name.to_string(),
        borough: borough.to_string(),
        service_zone: service_zone.map(str::to_string),
    }
}

fn sample_reason(code: &str, category: &str, description: &str, active: bool) -> ReasonCode {
    ReasonCode {
        reason_code: code.to_string(),
        category: category.to_string(),
        description: description.to_string(),
        active_flag: active,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_core::{PageRequest, SortSpec};

    fn slice(field: &str, order: SortOrder, page: u64, page_size: u32) -> Slice {
        Slice {
            page: PageRequest {
                page,
                page_size,
                offset: (page - 1) * u64::from(page_size),
            },
            sort: SortSpec::new(field, order),
        }
    }

    fn store() -> InMemoryStore {
        InMemoryStore::new(Dataset::sample())
    }

    #[tokio::test]
    async fn latest_pages_are_ordered_and_counted() {
        let store = store();
        let page: Page<PricingRow> = store
            .get_latest(&PricingFilter::default(), &slice("zone_id", SortOrder::Asc, 1, 5))
            .await
            .unwrap();
        assert_eq!(page.total_count, 12);
        assert_eq!(page.items.len(), 5);
        let ids: Vec<i64> = page.items.iter().map(|r| r.zone_id).collect();
        assert_eq!(ids, vec![132, 132, 132, 132, 161]);
        // tie-break on bucket_start_ts ascending
        assert!(page.items[0].bucket_start_ts < page.items[1].bucket_start_ts);
    }

    #[tokio::test]
    async fn page_past_end_is_empty() {
        let page: Page<ForecastRow> = store()
            .get_latest(
                &ForecastFilter::default(),
                &slice("bucket_start_ts", SortOrder::Desc, 9, 5),
            )
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 12);
    }

    #[tokio::test]
    async fn no_run_yields_warning() {
        let store = InMemoryStore::new(Dataset::default());
        let page: Page<PricingRow> = store
            .get_latest(&PricingFilter::default(), &slice("zone_id", SortOrder::Asc, 1, 5))
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.warnings, vec!["No pricing run found.".to_string()]);
    }

    #[tokio::test]
    async fn unknown_zone_is_rejected() {
        let err = RecordSource::<PricingRow, _, PricingFilter>::get_zone_timeline(
            &store(),
            4242,
            &TimeWindow::default(),
            &slice("bucket_start_ts", SortOrder::Asc, 1, 5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SourceError::ZoneNotFound(4242)));
    }

    #[tokio::test]
    async fn failed_runs_are_skipped_for_scoping() {
        let mut data = Dataset::sample();
        let mut failed = data.pricing_runs[0].clone();
        failed.run_id = "pricing-failed".into();
        failed.status = "FAILED".into();
        failed.started_at = failed.started_at.map(|t| t + Duration::hours(1));
        data.pricing_runs.push(failed);
        let store = InMemoryStore::new(data);

        let cov = store.coverage().await.unwrap();
        assert_eq!(cov.pricing_run_id.as_deref(), Some("pricing-2025-01-06T08"));

        // the newest run summary ignores status
        let latest =
            RecordSource::<PricingRow, PricingRunSummary, PricingFilter>::get_latest_run_summary(
                &store,
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.run_id, "pricing-failed");
    }

    #[tokio::test]
    async fn confidence_bands_are_sorted() {
        let summary = store().confidence().await.unwrap();
        let bands: Vec<&str> = summary
            .bands
            .iter()
            .map(|b| b.uncertainty_band.as_str())
            .collect();
        assert_eq!(bands, vec!["high", "low", "medium"]);
        assert!(summary.bands.iter().all(|b| b.row_count == 4));
    }

    #[tokio::test]
    async fn current_policy_picks_latest_active() {
        let mut data = Dataset::sample();
        data.policies.push(PolicySummary {
            policy_version: Some("policy-draft".into()),
            effective_from: Some(Utc::now()),
            active_flag: Some(false),
            policy_summary: None,
        });
        let store = InMemoryStore::new(data);
        let policy = store.current_policy().await.unwrap().unwrap();
        assert_eq!(policy.policy_version.as_deref(), Some("policy-v1"));
    }
}
