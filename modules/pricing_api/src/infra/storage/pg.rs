//! PostgreSQL data source.
//!
//! Table names come from configuration and are validated as bare
//! identifiers before they are spliced into SQL; every value goes through
//! a bind parameter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use query_core::Page;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{FromRow, Postgres, QueryBuilder};
use tracing::{debug, warn};

use apikit::{ReadinessProbe, ReadinessReport};

use crate::config::TableNames;
use crate::contract::error::SourceError;
use crate::contract::model::{
    ConfidenceSummary, CoverageSummary, ForecastFilter, ForecastRow, ForecastRunSummary,
    GuardrailSummary, PolicySummary, PricingFilter, PricingRow, PricingRunSummary, ReasonCode,
    ReasonCodeFilter, TimeWindow, Zone, ZoneFilter,
};
use crate::contract::source::{DiagnosticsSource, MetadataSource, RecordSource, Slice};
use crate::infra::storage::entity::{
    ConfidenceBandEntity, ForecastEntity, ForecastRunEntity, PolicyEntity, PricingEntity,
    PricingRunEntity, ReasonCodeEntity, ZoneEntity,
};
use crate::infra::storage::mapper;

const PRICING_COLUMNS: &str = "\
    p.zone_id::bigint AS zone_id, \
    p.bucket_start_ts::timestamptz AS bucket_start_ts, \
    p.pricing_run_key::text AS pricing_run_key, \
    p.run_id::text AS run_id, \
    p.forecast_run_id::text AS forecast_run_id, \
    z.zone::text AS zone_name, \
    z.borough::text AS borough, \
    z.service_zone::text AS service_zone, \
    p.final_multiplier::float8 AS final_multiplier, \
    p.raw_multiplier::float8 AS raw_multiplier, \
    p.pre_cap_multiplier::float8 AS pre_cap_multiplier, \
    p.post_cap_multiplier::float8 AS post_cap_multiplier, \
    p.confidence_score::float8 AS confidence_score, \
    p.uncertainty_band::text AS uncertainty_band, \
    p.y_pred::float8 AS y_pred, \
    p.y_pred_lower::float8 AS y_pred_lower, \
    p.y_pred_upper::float8 AS y_pred_upper, \
    p.cap_applied, \
    p.cap_type::text AS cap_type, \
    p.cap_reason::text AS cap_reason, \
    p.rate_limit_applied, \
    p.rate_limit_direction::text AS rate_limit_direction, \
    p.smoothing_applied, \
    p.primary_reason_code::text AS primary_reason_code, \
    p.reason_codes_json::text AS reason_codes_json, \
    p.reason_summary::text AS reason_summary, \
    p.pricing_policy_version::text AS pricing_policy_version";

const FORECAST_COLUMNS: &str = "\
    p.zone_id::bigint AS zone_id, \
    p.bucket_start_ts::timestamptz AS bucket_start_ts, \
    p.forecast_run_key::text AS forecast_run_key, \
    p.run_id::text AS run_id, \
    p.horizon_index::bigint AS horizon_index, \
    z.zone::text AS zone_name, \
    z.borough::text AS borough, \
    z.service_zone::text AS service_zone, \
    p.y_pred::float8 AS y_pred, \
    p.y_pred_lower::float8 AS y_pred_lower, \
    p.y_pred_upper::float8 AS y_pred_upper, \
    p.confidence_score::float8 AS confidence_score, \
    p.uncertainty_band::text AS uncertainty_band, \
    p.used_recursive_features, \
    p.model_name::text AS model_name, \
    p.model_version::text AS model_version, \
    p.model_stage::text AS model_stage, \
    p.feature_version::text AS feature_version";

const PRICING_RUN_COLUMNS: &str = "\
    run_id::text AS run_id, status::text AS status, \
    started_at::timestamptz AS started_at, ended_at::timestamptz AS ended_at, \
    failure_reason::text AS failure_reason, \
    pricing_policy_version::text AS pricing_policy_version, \
    forecast_run_id::text AS forecast_run_id, \
    target_bucket_start::timestamptz AS target_bucket_start, \
    target_bucket_end::timestamptz AS target_bucket_end, \
    zone_count::bigint AS zone_count, row_count::bigint AS row_count, \
    cap_applied_count::bigint AS cap_applied_count, \
    rate_limited_count::bigint AS rate_limited_count, \
    low_confidence_count::bigint AS low_confidence_count, \
    latency_ms::float8 AS latency_ms";

const FORECAST_RUN_COLUMNS: &str = "\
    run_id::text AS run_id, status::text AS status, \
    started_at::timestamptz AS started_at, ended_at::timestamptz AS ended_at, \
    failure_reason::text AS failure_reason, \
    model_name::text AS model_name, model_version::text AS model_version, \
    model_stage::text AS model_stage, feature_version::text AS feature_version, \
    forecast_run_key::text AS forecast_run_key, \
    forecast_start_ts::timestamptz AS forecast_start_ts, \
    forecast_end_ts::timestamptz AS forecast_end_ts, \
    horizon_buckets::bigint AS horizon_buckets, \
    bucket_minutes::bigint AS bucket_minutes, \
    zone_count::bigint AS zone_count, row_count::bigint AS row_count, \
    latency_ms::float8 AS latency_ms";

const ZONE_COLUMNS: &str = "\
    z.location_id::bigint AS zone_id, z.zone::text AS zone_name, \
    z.borough::text AS borough, z.service_zone::text AS service_zone";

const REASON_CODE_COLUMNS: &str = "\
    r.reason_code::text AS reason_code, r.category::text AS category, \
    r.description::text AS description, r.active_flag";

/// A bound value.
#[derive(Debug, Clone)]
enum Bind {
    Text(String),
    Int(i64),
    Bool(bool),
}

/// One `WHERE` predicate; conditions are joined with `AND`.
#[derive(Debug, Clone)]
enum Cond {
    Eq(&'static str, Bind),
    /// Case-insensitive text equality.
    LowerEq(&'static str, String),
    Gte(&'static str, DateTime<Utc>),
    Lte(&'static str, DateTime<Utc>),
    Raw(&'static str),
}

fn push_bind(qb: &mut QueryBuilder<'_, Postgres>, value: &Bind) {
    match value {
        Bind::Text(v) => qb.push_bind(v.clone()),
        Bind::Int(v) => qb.push_bind(*v),
        Bind::Bool(v) => qb.push_bind(*v),
    };
}

fn push_where(qb: &mut QueryBuilder<'_, Postgres>, conds: &[Cond]) {
    for (i, cond) in conds.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        match cond {
            Cond::Eq(col, value) => {
                qb.push(*col).push(" = ");
                push_bind(qb, value);
            }
            Cond::LowerEq(col, value) => {
                qb.push("LOWER(")
                    .push(*col)
                    .push(") = LOWER(")
                    .push_bind(value.clone())
                    .push(")");
            }
            Cond::Gte(col, ts) => {
                qb.push(*col).push(" >= ").push_bind(*ts);
            }
            Cond::Lte(col, ts) => {
                qb.push(*col).push(" <= ").push_bind(*ts);
            }
            Cond::Raw(sql) => {
                qb.push(*sql);
            }
        }
    }
}

fn window_conds(conds: &mut Vec<Cond>, window: &TimeWindow) {
    if let Some(start) = window.start {
        conds.push(Cond::Gte("p.bucket_start_ts", start));
    }
    if let Some(end) = window.end {
        conds.push(Cond::Lte("p.bucket_start_ts", end));
    }
}

fn pricing_conds(conds: &mut Vec<Cond>, filter: &PricingFilter) {
    if let Some(zone_id) = filter.zone_id {
        conds.push(Cond::Eq("p.zone_id", Bind::Int(zone_id)));
    }
    if let Some(borough) = &filter.borough {
        conds.push(Cond::LowerEq("z.borough", borough.clone()));
    }
    if let Some(band) = &filter.uncertainty_band {
        conds.push(Cond::LowerEq("p.uncertainty_band", band.clone()));
    }
    if let Some(cap) = filter.cap_applied {
        conds.push(Cond::Eq("p.cap_applied", Bind::Bool(cap)));
    }
    if let Some(rate) = filter.rate_limit_applied {
        conds.push(Cond::Eq("p.rate_limit_applied", Bind::Bool(rate)));
    }
}

fn forecast_conds(conds: &mut Vec<Cond>, filter: &ForecastFilter) {
    if let Some(zone_id) = filter.zone_id {
        conds.push(Cond::Eq("p.zone_id", Bind::Int(zone_id)));
    }
    if let Some(borough) = &filter.borough {
        conds.push(Cond::LowerEq("z.borough", borough.clone()));
    }
}

fn pricing_sort_column(field: &str) -> Option<&'static str> {
    Some(match field {
        "zone_id" => "p.zone_id",
        "bucket_start_ts" => "p.bucket_start_ts",
        "final_multiplier" => "p.final_multiplier",
        "raw_multiplier" => "p.raw_multiplier",
        "confidence_score" => "p.confidence_score",
        "borough" => "z.borough",
        _ => return None,
    })
}

fn forecast_sort_column(field: &str) -> Option<&'static str> {
    Some(match field {
        "zone_id" => "p.zone_id",
        "bucket_start_ts" => "p.bucket_start_ts",
        "y_pred" => "p.y_pred",
        "confidence_score" => "p.confidence_score",
        "borough" => "z.borough",
        _ => return None,
    })
}

fn zone_sort_column(field: &str) -> Option<&'static str> {
    Some(match field {
        "zone_id" => "z.location_id",
        "zone_name" => "z.zone",
        "borough" => "z.borough",
        _ => return None,
    })
}

fn reason_code_sort_column(field: &str) -> Option<&'static str> {
    Some(match field {
        "reason_code" => "r.reason_code",
        "category" => "r.category",
        "active_flag" => "r.active_flag",
        _ => return None,
    })
}

/// `ORDER BY` body: requested column, then the deterministic tie-breakers.
fn order_by(
    slice: &Slice,
    column: fn(&str) -> Option<&'static str>,
    tie_breakers: &str,
) -> Result<String, SourceError> {
    let col = column(&slice.sort.field)
        .ok_or_else(|| SourceError::UnmappedSortField(slice.sort.field.clone()))?;
    Ok(format!("{col} {}, {tie_breakers}", slice.sort.order.as_sql()))
}

/// Which record table a query targets.
struct RecordTables<'a> {
    data: &'a str,
    run_log: &'a str,
    created_col: &'static str,
    no_run_warning: &'static str,
}

pub struct PgStore {
    pool: PgPool,
    tables: TableNames,
}

impl PgStore {
    pub fn new(pool: PgPool, tables: TableNames) -> anyhow::Result<Self> {
        tables.validate()?;
        Ok(Self { pool, tables })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn pricing_tables(&self) -> RecordTables<'_> {
        RecordTables {
            data: &self.tables.pricing,
            run_log: &self.tables.pricing_run_log,
            created_col: "pricing_created_at",
            no_run_warning: "No pricing run found.",
        }
    }

    fn forecast_tables(&self) -> RecordTables<'_> {
        RecordTables {
            data: &self.tables.forecast,
            run_log: &self.tables.forecast_run_log,
            created_col: "forecast_created_at",
            no_run_warning: "No forecast run found.",
        }
    }

    fn joined(&self, data_table: &str) -> String {
        format!(
            "{data_table} p LEFT JOIN {} z ON z.location_id = p.zone_id",
            self.tables.zone
        )
    }

    /// Newest successful run in the log, else the run of the newest row.
    async fn latest_run_id(&self, t: &RecordTables<'_>) -> Result<Option<String>, SourceError> {
        let by_log = format!(
            "SELECT run_id::text FROM {} WHERE LOWER(status) = 'success' \
             ORDER BY started_at DESC NULLS LAST LIMIT 1",
            t.run_log
        );
        let run_id: Option<String> = sqlx::query_scalar(&by_log)
            .fetch_optional(&self.pool)
            .await
            .map_err(SourceError::backend)?;
        if run_id.is_some() {
            return Ok(run_id);
        }

        let fallback = format!(
            "SELECT run_id::text FROM {} ORDER BY {} DESC NULLS LAST LIMIT 1",
            t.data, t.created_col
        );
        let run_id: Option<String> = sqlx::query_scalar(&fallback)
            .fetch_optional(&self.pool)
            .await
            .map_err(SourceError::backend)?;
        if run_id.is_some() {
            debug!(table = t.data, "no successful run logged, using newest row's run");
        }
        Ok(run_id)
    }

    async fn zone_exists(&self, zone_id: i64) -> Result<bool, SourceError> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE location_id = $1)",
            self.tables.zone
        );
        sqlx::query_scalar(&sql)
            .bind(zone_id)
            .fetch_one(&self.pool)
            .await
            .map_err(SourceError::backend)
    }

    async fn table_exists(&self, table: &str) -> bool {
        let found: Result<bool, _> = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
            .bind(table)
            .fetch_one(&self.pool)
            .await;
        match found {
            Ok(found) => found,
            Err(e) => {
                warn!(table, error = %e, "table existence check failed");
                false
            }
        }
    }

    /// Runs the count and the page query over the same predicates.
    async fn fetch_page<E>(
        &self,
        columns: &str,
        from: &str,
        conds: &[Cond],
        order_by: &str,
        slice: &Slice,
    ) -> Result<Page<E>, SourceError>
    where
        E: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM ");
        count.push(from);
        push_where(&mut count, conds);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(SourceError::backend)?;

        let mut data = QueryBuilder::<Postgres>::new("SELECT ");
        data.push(columns).push(" FROM ").push(from);
        push_where(&mut data, conds);
        data.push(" ORDER BY ")
            .push(order_by)
            .push(" LIMIT ")
            .push_bind(i64::from(slice.page.limit()))
            .push(" OFFSET ")
            .push_bind(i64::try_from(slice.page.offset).unwrap_or(i64::MAX));
        let items = data
            .build_query_as::<E>()
            .fetch_all(&self.pool)
            .await
            .map_err(SourceError::backend)?;

        Ok(Page::new(items, u64::try_from(total).unwrap_or(0)))
    }

    /// Rows of the latest run matching `conds`.
    async fn scoped_page<E>(
        &self,
        t: &RecordTables<'_>,
        columns: &str,
        mut conds: Vec<Cond>,
        order_by: &str,
        slice: &Slice,
    ) -> Result<Page<E>, SourceError>
    where
        E: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let Some(run_id) = self.latest_run_id(t).await? else {
            return Ok(Page::empty_with_warning(t.no_run_warning));
        };
        conds.insert(0, Cond::Eq("p.run_id::text", Bind::Text(run_id)));
        self.fetch_page(columns, &self.joined(t.data), &conds, order_by, slice)
            .await
    }

    async fn pricing_page(
        &self,
        conds: Vec<Cond>,
        slice: &Slice,
    ) -> Result<Page<PricingRow>, SourceError> {
        let order = order_by(slice, pricing_sort_column, "p.zone_id ASC, p.bucket_start_ts ASC")?;
        let page: Page<PricingEntity> = self
            .scoped_page(&self.pricing_tables(), PRICING_COLUMNS, conds, &order, slice)
            .await?;
        Ok(page.map_items(mapper::pricing_to_contract))
    }

    async fn forecast_page(
        &self,
        conds: Vec<Cond>,
        slice: &Slice,
    ) -> Result<Page<ForecastRow>, SourceError> {
        let order = order_by(slice, forecast_sort_column, "p.zone_id ASC, p.bucket_start_ts ASC")?;
        let page: Page<ForecastEntity> = self
            .scoped_page(&self.forecast_tables(), FORECAST_COLUMNS, conds, &order, slice)
            .await?;
        Ok(page.map_items(mapper::forecast_to_contract))
    }

    async fn run_row<E>(
        &self,
        columns: &str,
        run_log: &str,
        run_id: Option<&str>,
    ) -> Result<Option<E>, SourceError>
    where
        E: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(columns).push(" FROM ").push(run_log);
        match run_id {
            Some(run_id) => {
                qb.push(" WHERE run_id::text = ").push_bind(run_id.to_string());
            }
            None => {
                qb.push(" ORDER BY started_at DESC NULLS LAST");
            }
        }
        qb.push(" LIMIT 1");
        qb.build_query_as::<E>()
            .fetch_optional(&self.pool)
            .await
            .map_err(SourceError::backend)
    }

    async fn run_counts(
        &self,
        table: &str,
        run_id: Option<&str>,
    ) -> Result<(u64, u64), SourceError> {
        let Some(run_id) = run_id else {
            return Ok((0, 0));
        };
        let sql = format!(
            "SELECT COUNT(DISTINCT zone_id), COUNT(*) FROM {table} WHERE run_id::text = $1"
        );
        let (zones, rows): (i64, i64) = sqlx::query_as(&sql)
            .bind(run_id)
            .fetch_one(&self.pool)
            .await
            .map_err(SourceError::backend)?;
        Ok((to_count(zones), to_count(rows)))
    }
}

fn to_count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

#[async_trait]
impl RecordSource<PricingRow, PricingRunSummary, PricingFilter> for PgStore {
    async fn get_latest(
        &self,
        filter: &PricingFilter,
        slice: &Slice,
    ) -> Result<Page<PricingRow>, SourceError> {
        let mut conds = Vec::new();
        pricing_conds(&mut conds, filter);
        self.pricing_page(conds, slice).await
    }

    async fn get_window(
        &self,
        window: &TimeWindow,
        filter: &PricingFilter,
        slice: &Slice,
    ) -> Result<Page<PricingRow>, SourceError> {
        let mut conds = Vec::new();
        window_conds(&mut conds, window);
        pricing_conds(&mut conds, filter);
        self.pricing_page(conds, slice).await
    }

    async fn get_zone_timeline(
        &self,
        zone_id: i64,
        window: &TimeWindow,
        slice: &Slice,
    ) -> Result<Page<PricingRow>, SourceError> {
        if !self.zone_exists(zone_id).await? {
            return Err(SourceError::ZoneNotFound(zone_id));
        }
        let mut conds = vec![Cond::Eq("p.zone_id", Bind::Int(zone_id))];
        window_conds(&mut conds, window);
        self.pricing_page(conds, slice).await
    }

    async fn get_latest_run_summary(&self) -> Result<Option<PricingRunSummary>, SourceError> {
        let row: Option<PricingRunEntity> = self
            .run_row(PRICING_RUN_COLUMNS, &self.tables.pricing_run_log, None)
            .await?;
        Ok(row.map(mapper::pricing_run_to_contract))
    }

    async fn get_run_summary(
        &self,
        run_id: &str,
    ) -> Result<Option<PricingRunSummary>, SourceError> {
        let row: Option<PricingRunEntity> = self
            .run_row(PRICING_RUN_COLUMNS, &self.tables.pricing_run_log, Some(run_id))
            .await?;
        Ok(row.map(mapper::pricing_run_to_contract))
    }
}

#[async_trait]
impl RecordSource<ForecastRow, ForecastRunSummary, ForecastFilter> for PgStore {
    async fn get_latest(
        &self,
        filter: &ForecastFilter,
        slice: &Slice,
    ) -> Result<Page<ForecastRow>, SourceError> {
        let mut conds = Vec::new();
        forecast_conds(&mut conds, filter);
        self.forecast_page(conds, slice).await
    }

    async fn get_window(
        &self,
        window: &TimeWindow,
        filter: &ForecastFilter,
        slice: &Slice,
    ) -> Result<Page<ForecastRow>, SourceError> {
        let mut conds = Vec::new();
        window_conds(&mut conds, window);
        forecast_conds(&mut conds, filter);
        self.forecast_page(conds, slice).await
    }

    async fn get_zone_timeline(
        &self,
        zone_id: i64,
        window: &TimeWindow,
        slice: &Slice,
    ) -> Result<Page<ForecastRow>, SourceError> {
        if !self.zone_exists(zone_id).await? {
            return Err(SourceError::ZoneNotFound(zone_id));
        }
        let mut conds = vec![Cond::Eq("p.zone_id", Bind::Int(zone_id))];
        window_conds(&mut conds, window);
        self.forecast_page(conds, slice).await
    }

    async fn get_latest_run_summary(&self) -> Result<Option<ForecastRunSummary>, SourceError> {
        let row: Option<ForecastRunEntity> = self
            .run_row(FORECAST_RUN_COLUMNS, &self.tables.forecast_run_log, None)
            .await?;
        Ok(row.map(mapper::forecast_run_to_contract))
    }

    async fn get_run_summary(
        &self,
        run_id: &str,
    ) -> Result<Option<ForecastRunSummary>, SourceError> {
        let row: Option<ForecastRunEntity> = self
            .run_row(FORECAST_RUN_COLUMNS, &self.tables.forecast_run_log, Some(run_id))
            .await?;
        Ok(row.map(mapper::forecast_run_to_contract))
    }
}

#[async_trait]
impl MetadataSource for PgStore {
    async fn zones(&self, filter: &ZoneFilter, slice: &Slice) -> Result<Page<Zone>, SourceError> {
        let mut conds = Vec::new();
        if let Some(borough) = &filter.borough {
            conds.push(Cond::LowerEq("z.borough", borough.clone()));
        }
        if let Some(service_zone) = &filter.service_zone {
            conds.push(Cond::LowerEq("COALESCE(z.service_zone, '')", service_zone.clone()));
        }
        let order = order_by(slice, zone_sort_column, "z.location_id ASC")?;
        let from = format!("{} z", self.tables.zone);
        let page: Page<ZoneEntity> = self
            .fetch_page(ZONE_COLUMNS, &from, &conds, &order, slice)
            .await?;
        Ok(page.map_items(mapper::zone_to_contract))
    }

    async fn reason_codes(
        &self,
        filter: &ReasonCodeFilter,
        slice: &Slice,
    ) -> Result<Page<ReasonCode>, SourceError> {
        let mut conds = Vec::new();
        if let Some(category) = &filter.category {
            conds.push(Cond::LowerEq("r.category", category.clone()));
        }
        if filter.active_only {
            conds.push(Cond::Raw("r.active_flag = TRUE"));
        }
        let order = order_by(slice, reason_code_sort_column, "r.reason_code ASC")?;
        let from = format!("{} r", self.tables.reason_code);
        let page: Page<ReasonCodeEntity> = self
            .fetch_page(REASON_CODE_COLUMNS, &from, &conds, &order, slice)
            .await?;
        Ok(page.map_items(mapper::reason_code_to_contract))
    }

    async fn current_policy(&self) -> Result<Option<PolicySummary>, SourceError> {
        let sql = format!(
            "SELECT policy_version::text AS policy_version, \
                    effective_from::timestamptz AS effective_from, \
                    active_flag, \
                    config_json::text AS policy_summary \
             FROM {} \
             WHERE active_flag = TRUE \
             ORDER BY effective_from DESC NULLS LAST, created_at DESC NULLS LAST \
             LIMIT 1",
            self.tables.policy_snapshot
        );
        let row: Option<PolicyEntity> = sqlx::query_as(&sql)
            .fetch_optional(&self.pool)
            .await
            .map_err(SourceError::backend)?;
        Ok(row.map(mapper::policy_to_contract))
    }
}

#[async_trait]
impl DiagnosticsSource for PgStore {
    async fn coverage(&self) -> Result<CoverageSummary, SourceError> {
        let pricing_run = self.latest_run_id(&self.pricing_tables()).await?;
        let forecast_run = self.latest_run_id(&self.forecast_tables()).await?;
        let (pricing_zone_count, pricing_row_count) = self
            .run_counts(&self.tables.pricing, pricing_run.as_deref())
            .await?;
        let (forecast_zone_count, forecast_row_count) = self
            .run_counts(&self.tables.forecast, forecast_run.as_deref())
            .await?;
        Ok(CoverageSummary {
            pricing_run_id: pricing_run,
            forecast_run_id: forecast_run,
            pricing_zone_count,
            forecast_zone_count,
            pricing_row_count,
            forecast_row_count,
        })
    }

    async fn guardrails(&self) -> Result<GuardrailSummary, SourceError> {
        let Some(run_id) = self.latest_run_id(&self.pricing_tables()).await? else {
            return Ok(GuardrailSummary::default());
        };
        let sql = format!(
            "SELECT COUNT(*), \
                    COALESCE(SUM(CASE WHEN cap_applied THEN 1 ELSE 0 END), 0)::bigint, \
                    COALESCE(SUM(CASE WHEN rate_limit_applied THEN 1 ELSE 0 END), 0)::bigint, \
                    COALESCE(SUM(CASE WHEN smoothing_applied THEN 1 ELSE 0 END), 0)::bigint \
             FROM {} WHERE run_id::text = $1",
            self.tables.pricing
        );
        let (total, capped, rate_limited, smoothed): (i64, i64, i64, i64) = sqlx::query_as(&sql)
            .bind(run_id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(SourceError::backend)?;
        Ok(GuardrailSummary {
            pricing_run_id: Some(run_id),
            total_rows: to_count(total),
            cap_applied_rows: to_count(capped),
            rate_limited_rows: to_count(rate_limited),
            smoothing_applied_rows: to_count(smoothed),
            cap_applied_rate: 0.0,
            rate_limited_rate: 0.0,
        }
        .with_rates())
    }

    async fn confidence(&self) -> Result<ConfidenceSummary, SourceError> {
        let Some(run_id) = self.latest_run_id(&self.forecast_tables()).await? else {
            return Ok(ConfidenceSummary::default());
        };
        let sql = format!(
            "SELECT COALESCE(uncertainty_band::text, 'unknown') AS uncertainty_band, \
                    COUNT(*) AS row_count, \
                    COALESCE(AVG(confidence_score), 0)::float8 AS avg_confidence_score \
             FROM {} WHERE run_id::text = $1 \
             GROUP BY 1 ORDER BY 1 ASC",
            self.tables.forecast
        );
        let bands: Vec<ConfidenceBandEntity> = sqlx::query_as(&sql)
            .bind(run_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(SourceError::backend)?;
        Ok(ConfidenceSummary {
            forecast_run_id: Some(run_id),
            bands: bands
                .into_iter()
                .map(mapper::confidence_band_to_contract)
                .collect(),
        })
    }
}

#[async_trait]
impl ReadinessProbe for PgStore {
    async fn readiness(&self) -> ReadinessReport {
        let db_connected = match sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "database ping failed");
                false
            }
        };
        if !db_connected {
            return ReadinessReport::default();
        }
        ReadinessReport {
            db_connected,
            pricing_source_ready: self.table_exists(&self.tables.pricing).await,
            forecast_source_ready: self.table_exists(&self.tables.forecast).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_core::{PageRequest, SortOrder, SortSpec};

    fn slice(field: &str, order: SortOrder) -> Slice {
        Slice {
            page: PageRequest {
                page: 1,
                page_size: 10,
                offset: 0,
            },
            sort: SortSpec::new(field, order),
        }
    }

    #[test]
    fn where_clause_binds_every_value() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM t p");
        let mut conds = vec![Cond::Eq("p.run_id::text", Bind::Text("r1".into()))];
        window_conds(
            &mut conds,
            &TimeWindow {
                start: Some(Utc::now()),
                end: None,
            },
        );
        pricing_conds(
            &mut conds,
            &PricingFilter {
                borough: Some("Queens".into()),
                cap_applied: Some(true),
                ..Default::default()
            },
        );
        push_where(&mut qb, &conds);
        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM t p WHERE p.run_id::text = $1 AND p.bucket_start_ts >= $2 \
             AND LOWER(z.borough) = LOWER($3) AND p.cap_applied = $4"
        );
    }

    #[test]
    fn order_by_appends_tie_breakers() {
        let order = order_by(
            &slice("borough", SortOrder::Desc),
            pricing_sort_column,
            "p.zone_id ASC, p.bucket_start_ts ASC",
        )
        .unwrap();
        assert_eq!(order, "z.borough DESC, p.zone_id ASC, p.bucket_start_ts ASC");
    }

    #[test]
    fn zone_sort_maps_to_location_id() {
        let order = order_by(
            &slice("zone_id", SortOrder::Asc),
            zone_sort_column,
            "z.location_id ASC",
        )
        .unwrap();
        assert_eq!(order, "z.location_id ASC, z.location_id ASC");
    }

    #[test]
    fn unmapped_sort_field_is_an_error() {
        let err = order_by(&slice("y_pred", SortOrder::Asc), pricing_sort_column, "x").unwrap_err();
        assert!(matches!(err, SourceError::UnmappedSortField(f) if f == "y_pred"));
    }
}
