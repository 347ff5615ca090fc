use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::contract::model::{
    ForecastFilter, PricingFilter, ReasonCodeFilter, TimeWindow, ZoneFilter,
};
use crate::domain::error::DomainError;
use crate::domain::service::Paging;

/// Paging, sort and presentation parameters shared by every list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    /// Alias of `page_size`; wins when both are given.
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub include_plain_language_fields: Option<bool>,
}

impl ListParams {
    pub fn paging(&self) -> Paging {
        Paging {
            page: self.page,
            page_size: self.page_size,
            limit: self.limit,
            sort: self.sort.clone(),
        }
    }
}

/// `zone_id` / `borough` scoping used by latest listings and the forecast window.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoneScopeQuery {
    pub zone_id: Option<i64>,
    pub borough: Option<String>,
}

impl ZoneScopeQuery {
    pub fn pricing_filter(self) -> PricingFilter {
        PricingFilter {
            zone_id: self.zone_id,
            borough: non_blank(self.borough),
            ..Default::default()
        }
    }

    pub fn forecast_filter(self) -> ForecastFilter {
        ForecastFilter {
            zone_id: self.zone_id,
            borough: non_blank(self.borough),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PricingWindowQuery {
    pub zone_id: Option<i64>,
    pub borough: Option<String>,
    pub uncertainty_band: Option<String>,
    pub cap_applied: Option<bool>,
    pub rate_limit_applied: Option<bool>,
}

impl From<PricingWindowQuery> for PricingFilter {
    fn from(q: PricingWindowQuery) -> Self {
        Self {
            zone_id: q.zone_id,
            borough: non_blank(q.borough),
            uncertainty_band: non_blank(q.uncertainty_band),
            cap_applied: q.cap_applied,
            rate_limit_applied: q.rate_limit_applied,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoneQuery {
    pub borough: Option<String>,
    pub service_zone: Option<String>,
}

impl From<ZoneQuery> for ZoneFilter {
    fn from(q: ZoneQuery) -> Self {
        Self {
            borough: non_blank(q.borough),
            service_zone: non_blank(q.service_zone),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReasonCodeQuery {
    pub category: Option<String>,
    pub active_only: Option<bool>,
}

impl From<ReasonCodeQuery> for ReasonCodeFilter {
    fn from(q: ReasonCodeQuery) -> Self {
        Self {
            category: non_blank(q.category),
            active_only: q.active_only.unwrap_or(true),
        }
    }
}

/// Raw `start_ts` / `end_ts` query values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WindowQuery {
    pub start_ts: Option<String>,
    pub end_ts: Option<String>,
}

impl WindowQuery {
    /// Both bounds must be present.
    pub fn required(&self) -> Result<TimeWindow, DomainError> {
        match (self.start_ts.as_deref(), self.end_ts.as_deref()) {
            (Some(start), Some(end)) => Ok(TimeWindow::between(
                parse_timestamp("start_ts", start)?,
                parse_timestamp("end_ts", end)?,
            )),
            _ => Err(DomainError::invalid_time_window(
                "start_ts and end_ts are required.",
            )),
        }
    }

    /// Each bound is independently optional.
    pub fn optional(&self) -> Result<TimeWindow, DomainError> {
        Ok(TimeWindow {
            start: self
                .start_ts
                .as_deref()
                .map(|raw| parse_timestamp("start_ts", raw))
                .transpose()?,
            end: self
                .end_ts
                .as_deref()
                .map(|raw| parse_timestamp("end_ts", raw))
                .transpose()?,
        })
    }
}

/// RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS[.f]` read as UTC.
///
/// A `+` offset arrives as a space once the query string is decoded, so a
/// space in offset position is read back as `+`.
fn parse_timestamp(name: &str, raw: &str) -> Result<DateTime<Utc>, DomainError> {
    let trimmed = raw.trim();
    let candidates = [trimmed.to_string(), trimmed.replace(' ', "+")];
    for candidate in &candidates {
        if let Ok(ts) = DateTime::parse_from_rfc3339(candidate) {
            return Ok(ts.with_timezone(&Utc));
        }
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    Err(DomainError::invalid_time_window(format!(
        "{name} must be an ISO 8601 timestamp, got '{raw}'."
    )))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
