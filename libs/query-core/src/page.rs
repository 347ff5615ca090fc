use serde::{Deserialize, Serialize};

use crate::{Error, SortSpec};

/// Page size bounds coming from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 200,
        }
    }
}

/// Validated pagination triple handed to data sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u32,
    pub offset: u64,
}

impl PageRequest {
    pub fn limit(&self) -> u32 {
        self.page_size
    }
}

/// Resolve raw pagination inputs.
///
/// `limit` wins over `page_size` when both are present; either way the
/// resolved size must fall within `[1, max_page_size]`. Pages past the end
/// of the result set are accepted and simply produce an empty page.
pub fn normalize(
    page: Option<i64>,
    page_size: Option<i64>,
    limit: Option<i64>,
    limits: PageLimits,
) -> Result<PageRequest, Error> {
    let page = page.unwrap_or(1);
    if page < 1 {
        return Err(Error::InvalidPage);
    }

    let size = limit
        .or(page_size)
        .unwrap_or_else(|| i64::from(limits.default_page_size));
    if size < 1 {
        return Err(Error::PageSizeTooSmall);
    }
    if size > i64::from(limits.max_page_size) {
        return Err(Error::PageSizeTooLarge {
            max: limits.max_page_size,
        });
    }

    // Both values are positive and size fits in u32 after the bound check.
    let page = page as u64;
    let page_size = size as u32;
    let offset = (page - 1).saturating_mul(u64::from(page_size));

    Ok(PageRequest {
        page,
        page_size,
        offset,
    })
}

/// Number of pages needed for `total_count` rows; zero for an empty set.
pub fn total_pages(total_count: u64, page_size: u32) -> u64 {
    if total_count == 0 || page_size == 0 {
        return 0;
    }
    (total_count - 1) / u64::from(page_size) + 1
}

/// Pagination block echoed back in list envelopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u64,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u64,
    pub sort: String,
}

impl PaginationMeta {
    pub fn new(request: &PageRequest, total_count: u64, sort: &SortSpec) -> Self {
        Self {
            page: request.page,
            page_size: request.page_size,
            total_count,
            total_pages: total_pages(total_count, request.page_size),
            sort: sort.to_string(),
        }
    }
}

/// One slice of rows as reported by a data source.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub warnings: Vec<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: u64) -> Self {
        Self {
            items,
            total_count,
            warnings: Vec::new(),
        }
    }

    /// An empty page carrying a single advisory warning.
    pub fn empty_with_warning(warning: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            warnings: vec![warning.into()],
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Map items while preserving counts and warnings (row -> view mapping)
    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            warnings: self.warnings,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::new(Vec::new(), 0)
    }
}
