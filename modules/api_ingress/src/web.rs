use std::sync::Arc;

use apikit::api::problem::rfc3339_utc;
use apikit::{ReadinessProbe, ReadinessReport, VersionInfo, XRequestId};
use axum::{extract::Extension, response::Json};
use chrono::{DateTime, Utc};
use runtime::ApiConfig;
use serde::Serialize;

/// What the unversioned health endpoints report on.
pub struct HealthState {
    pub api: ApiConfig,
    pub version: VersionInfo,
    pub probe: Arc<dyn ReadinessProbe>,
}

impl HealthState {
    pub fn new(api: ApiConfig, probe: Arc<dyn ReadinessProbe>) -> Self {
        let version = VersionInfo::from_path(&api.api_version_path, api.schema_version.clone());
        Self {
            api,
            version,
            probe,
        }
    }

    fn stamp(&self, rid: XRequestId) -> Stamp {
        Stamp {
            api_version: self.version.api_version.clone(),
            schema_version: self.version.schema_version.clone(),
            request_id: rid.0,
            timestamp: Utc::now(),
        }
    }
}

/// Fields shared by every health body.
#[derive(Debug, Serialize)]
pub struct Stamp {
    pub api_version: String,
    pub schema_version: String,
    pub request_id: String,
    #[serde(serialize_with = "rfc3339_utc")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct HealthBody {
    #[serde(flatten)]
    pub stamp: Stamp,
    pub status: &'static str,
    pub environment: String,
    pub service_name: String,
}

#[derive(Debug, Serialize)]
pub struct ReadyBody {
    #[serde(flatten)]
    pub stamp: Stamp,
    #[serde(flatten)]
    pub report: ReadinessReport,
    pub ready: bool,
    pub database: &'static str,
}

#[derive(Debug, Serialize)]
pub struct VersionBody {
    #[serde(flatten)]
    pub stamp: Stamp,
    pub api_version_path: String,
    pub app_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<&'static str>,
    pub project: String,
    pub version: String,
}

type State = Extension<Arc<HealthState>>;

pub async fn health(Extension(state): State, rid: XRequestId) -> Json<HealthBody> {
    Json(HealthBody {
        stamp: state.stamp(rid),
        status: "ok",
        environment: state.api.environment.clone(),
        service_name: state.api.service_name.clone(),
    })
}

/// Always 200; callers read `ready` to decide.
pub async fn ready(Extension(state): State, rid: XRequestId) -> Json<ReadyBody> {
    let report = state.probe.readiness().await;
    if !report.ready() {
        tracing::warn!(?report, "data sources not ready");
    }
    Json(ReadyBody {
        stamp: state.stamp(rid),
        ready: report.ready(),
        database: if report.db_connected {
            "reachable"
        } else {
            "unreachable"
        },
        report,
    })
}

pub async fn version(Extension(state): State, rid: XRequestId) -> Json<VersionBody> {
    Json(VersionBody {
        stamp: state.stamp(rid),
        api_version_path: state.api.api_version_path.clone(),
        app_version: state.api.app_version.clone(),
        git_commit: option_env!("GIT_COMMIT").filter(|c| !c.is_empty()),
        project: state.api.service_name.clone(),
        version: state.api.app_version.clone(),
    })
}
