//! Transport-agnostic request normalization for list endpoints.
//!
//! Two pure building blocks live here:
//! - [`normalize`] turns raw `page` / `page_size` / `limit` inputs into a
//!   validated [`PageRequest`];
//! - [`parse_sort`] turns a raw `field:order` string into a [`SortSpec`]
//!   checked against a per-endpoint allow-list.
//!
//! Both fail with [`Error`], which the HTTP layer maps onto its
//! `INVALID_QUERY_PARAM` error code.

mod page;
mod sort;

pub use page::{normalize, total_pages, Page, PageLimits, PageRequest, PaginationMeta};
pub use sort::{parse_sort, SortOrder, SortSpec};

/// Validation failures for pagination and sorting inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("page must be >= 1")]
    InvalidPage,

    #[error("page_size must be >= 1")]
    PageSizeTooSmall,

    #[error("page_size must be <= {max}")]
    PageSizeTooLarge { max: u32 },

    #[error("sort must use the form 'field:order' (got '{0}')")]
    MalformedSort(String),

    #[error("Unsupported sort field '{field}'. Supported fields: {supported}")]
    UnsupportedSortField { field: String, supported: String },

    #[error("Unsupported sort order '{0}'. Supported orders: asc, desc")]
    UnsupportedSortOrder(String),
}

impl Error {
    /// Name of the query parameter the failure refers to.
    pub fn parameter(&self) -> &'static str {
        match self {
            Error::InvalidPage => "page",
            Error::PageSizeTooSmall | Error::PageSizeTooLarge { .. } => "page_size",
            Error::MalformedSort(_)
            | Error::UnsupportedSortField { .. }
            | Error::UnsupportedSortOrder(_) => "sort",
        }
    }
}
