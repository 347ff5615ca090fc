use std::sync::Arc;

use axum::{extract::Path, Extension};
use tracing::info;

use apikit::{ApiError, ApiResult, Envelope, ValidQuery, XRequestId};

use crate::api::rest::dto::{
    ListParams, PricingWindowQuery, ReasonCodeQuery, WindowQuery, ZoneQuery, ZoneScopeQuery,
};
use crate::contract::model::{
    ConfidenceSummary, CoverageSummary, ForecastRunSummary, GuardrailSummary, PolicySummary,
    PricingRunSummary, ReasonCode, Zone,
};
use crate::contract::source::{
    FORECAST_SORT_FIELDS, PRICING_SORT_FIELDS, REASON_CODE_DEFAULT_SORT,
    REASON_CODE_SORT_FIELDS, ZONE_DEFAULT_SORT, ZONE_SORT_FIELDS,
};
use crate::domain::catalog::SchemaCatalog;
use crate::domain::service::Service;
use crate::domain::view::{ForecastView, PricingView};

type Svc = Extension<Arc<Service>>;

fn parse_zone_id(raw: &str) -> ApiResult<i64> {
    raw.trim().parse::<i64>().map_err(|_| {
        ApiError::invalid_parameter("zone_id", format!("zone_id must be an integer, got '{raw}'."))
    })
}

// ---- pricing ----

pub async fn pricing_latest(
    Extension(svc): Svc,
    rid: XRequestId,
    ValidQuery(list): ValidQuery<ListParams>,
    ValidQuery(scope): ValidQuery<ZoneScopeQuery>,
) -> ApiResult<Envelope<Vec<PricingView>>> {
    let slice = svc.slice(&list.paging(), PRICING_SORT_FIELDS, None)?;
    let annotate = svc.annotate(list.include_plain_language_fields);
    let page = svc
        .pricing
        .latest(&scope.pricing_filter(), &slice, annotate)
        .await?;
    Ok(svc.version().list(&rid, page, &slice.page, &slice.sort))
}

pub async fn pricing_window(
    Extension(svc): Svc,
    rid: XRequestId,
    ValidQuery(list): ValidQuery<ListParams>,
    ValidQuery(window): ValidQuery<WindowQuery>,
    ValidQuery(filter): ValidQuery<PricingWindowQuery>,
) -> ApiResult<Envelope<Vec<PricingView>>> {
    let window = window.required()?;
    let slice = svc.slice(&list.paging(), PRICING_SORT_FIELDS, None)?;
    let annotate = svc.annotate(list.include_plain_language_fields);
    let page = svc
        .pricing
        .window(&window, &filter.into(), &slice, annotate)
        .await?;
    Ok(svc.version().list(&rid, page, &slice.page, &slice.sort))
}

pub async fn pricing_zone_timeline(
    Extension(svc): Svc,
    rid: XRequestId,
    Path(zone_id): Path<String>,
    ValidQuery(list): ValidQuery<ListParams>,
    ValidQuery(window): ValidQuery<WindowQuery>,
) -> ApiResult<Envelope<Vec<PricingView>>> {
    let zone_id = parse_zone_id(&zone_id)?;
    let window = window.optional()?;
    let slice = svc.slice(&list.paging(), PRICING_SORT_FIELDS, None)?;
    let annotate = svc.annotate(list.include_plain_language_fields);
    let page = svc
        .pricing
        .zone_timeline(zone_id, &window, &slice, annotate)
        .await?;
    Ok(svc.version().list(&rid, page, &slice.page, &slice.sort))
}

pub async fn pricing_latest_run(
    Extension(svc): Svc,
    rid: XRequestId,
) -> ApiResult<Envelope<PricingRunSummary>> {
    let run = svc.pricing.latest_run().await?;
    Ok(svc.version().envelope(&rid, run))
}

pub async fn pricing_run(
    Extension(svc): Svc,
    rid: XRequestId,
    Path(run_id): Path<String>,
) -> ApiResult<Envelope<PricingRunSummary>> {
    info!(%run_id, "fetching pricing run summary");
    let run = svc.pricing.run(&run_id).await?;
    Ok(svc.version().envelope(&rid, run))
}

// ---- forecast ----

pub async fn forecast_latest(
    Extension(svc): Svc,
    rid: XRequestId,
    ValidQuery(list): ValidQuery<ListParams>,
    ValidQuery(scope): ValidQuery<ZoneScopeQuery>,
) -> ApiResult<Envelope<Vec<ForecastView>>> {
    let slice = svc.slice(&list.paging(), FORECAST_SORT_FIELDS, None)?;
    let annotate = svc.annotate(list.include_plain_language_fields);
    let page = svc
        .forecast
        .latest(&scope.forecast_filter(), &slice, annotate)
        .await?;
    Ok(svc.version().list(&rid, page, &slice.page, &slice.sort))
}

pub async fn forecast_window(
    Extension(svc): Svc,
    rid: XRequestId,
    ValidQuery(list): ValidQuery<ListParams>,
    ValidQuery(window): ValidQuery<WindowQuery>,
    ValidQuery(scope): ValidQuery<ZoneScopeQuery>,
) -> ApiResult<Envelope<Vec<ForecastView>>> {
    let window = window.required()?;
    let slice = svc.slice(&list.paging(), FORECAST_SORT_FIELDS, None)?;
    let annotate = svc.annotate(list.include_plain_language_fields);
    let page = svc
        .forecast
        .window(&window, &scope.forecast_filter(), &slice, annotate)
        .await?;
    Ok(svc.version().list(&rid, page, &slice.page, &slice.sort))
}

pub async fn forecast_zone_timeline(
    Extension(svc): Svc,
    rid: XRequestId,
    Path(zone_id): Path<String>,
    ValidQuery(list): ValidQuery<ListParams>,
    ValidQuery(window): ValidQuery<WindowQuery>,
) -> ApiResult<Envelope<Vec<ForecastView>>> {
    let zone_id = parse_zone_id(&zone_id)?;
    let window = window.optional()?;
    let slice = svc.slice(&list.paging(), FORECAST_SORT_FIELDS, None)?;
    let annotate = svc.annotate(list.include_plain_language_fields);
    let page = svc
        .forecast
        .zone_timeline(zone_id, &window, &slice, annotate)
        .await?;
    Ok(svc.version().list(&rid, page, &slice.page, &slice.sort))
}

pub async fn forecast_latest_run(
    Extension(svc): Svc,
    rid: XRequestId,
) -> ApiResult<Envelope<ForecastRunSummary>> {
    let run = svc.forecast.latest_run().await?;
    Ok(svc.version().envelope(&rid, run))
}

pub async fn forecast_run(
    Extension(svc): Svc,
    rid: XRequestId,
    Path(run_id): Path<String>,
) -> ApiResult<Envelope<ForecastRunSummary>> {
    info!(%run_id, "fetching forecast run summary");
    let run = svc.forecast.run(&run_id).await?;
    Ok(svc.version().envelope(&rid, run))
}

// ---- metadata ----

pub async fn zones(
    Extension(svc): Svc,
    rid: XRequestId,
    ValidQuery(list): ValidQuery<ListParams>,
    ValidQuery(filter): ValidQuery<ZoneQuery>,
) -> ApiResult<Envelope<Vec<Zone>>> {
    let slice = svc.slice(&list.paging(), ZONE_SORT_FIELDS, Some(ZONE_DEFAULT_SORT))?;
    let page = svc.zones(&filter.into(), &slice).await?;
    Ok(svc.version().list(&rid, page, &slice.page, &slice.sort))
}

pub async fn reason_codes(
    Extension(svc): Svc,
    rid: XRequestId,
    ValidQuery(list): ValidQuery<ListParams>,
    ValidQuery(filter): ValidQuery<ReasonCodeQuery>,
) -> ApiResult<Envelope<Vec<ReasonCode>>> {
    let slice = svc.slice(
        &list.paging(),
        REASON_CODE_SORT_FIELDS,
        Some(REASON_CODE_DEFAULT_SORT),
    )?;
    let page = svc.reason_codes(&filter.into(), &slice).await?;
    Ok(svc.version().list(&rid, page, &slice.page, &slice.sort))
}

pub async fn current_policy(
    Extension(svc): Svc,
    rid: XRequestId,
) -> ApiResult<Envelope<PolicySummary>> {
    let policy = svc.current_policy().await?;
    Ok(svc.version().envelope(&rid, policy))
}

pub async fn schema_catalog(Extension(svc): Svc, rid: XRequestId) -> Envelope<SchemaCatalog> {
    svc.version().envelope(&rid, svc.schema_catalog())
}

// ---- diagnostics ----

pub async fn coverage(
    Extension(svc): Svc,
    rid: XRequestId,
) -> ApiResult<Envelope<CoverageSummary>> {
    let coverage = svc.coverage().await?;
    Ok(svc.version().envelope(&rid, coverage))
}

pub async fn guardrails(
    Extension(svc): Svc,
    rid: XRequestId,
) -> ApiResult<Envelope<GuardrailSummary>> {
    let summary = svc.guardrails().await?;
    Ok(svc.version().envelope(&rid, summary))
}

pub async fn confidence(
    Extension(svc): Svc,
    rid: XRequestId,
) -> ApiResult<Envelope<ConfidenceSummary>> {
    let summary = svc.confidence().await?;
    Ok(svc.version().envelope(&rid, summary))
}
