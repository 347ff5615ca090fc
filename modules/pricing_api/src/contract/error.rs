use thiserror::Error;

/// Errors reported by data sources.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Unknown zone_id: {0}")]
    ZoneNotFound(i64),

    #[error("sort field '{0}' has no column mapping")]
    UnmappedSortField(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl SourceError {
    pub fn backend(err: impl Into<anyhow::Error>) -> Self {
        SourceError::Backend(err.into())
    }
}
