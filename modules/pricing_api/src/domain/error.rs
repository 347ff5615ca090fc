use thiserror::Error;

use crate::contract::error::SourceError;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error(transparent)]
    Query(#[from] query_core::Error),

    #[error("{message}")]
    InvalidParameter {
        parameter: &'static str,
        message: String,
    },

    #[error("{0}")]
    InvalidTimeWindow(String),

    #[error("Unknown zone_id: {0}")]
    ZoneNotFound(i64),

    #[error("{0}")]
    RunNotFound(String),

    #[error("data source failure")]
    Source(#[source] anyhow::Error),
}

impl DomainError {
    pub fn invalid_parameter(parameter: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter,
            message: message.into(),
        }
    }

    pub fn invalid_time_window(message: impl Into<String>) -> Self {
        Self::InvalidTimeWindow(message.into())
    }

    pub fn run_not_found(message: impl Into<String>) -> Self {
        Self::RunNotFound(message.into())
    }
}

impl From<SourceError> for DomainError {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::ZoneNotFound(zone_id) => DomainError::ZoneNotFound(zone_id),
            SourceError::UnmappedSortField(field) => {
                DomainError::Source(anyhow::anyhow!("no column mapping for sort field '{field}'"))
            }
            SourceError::Backend(err) => DomainError::Source(err),
        }
    }
}
