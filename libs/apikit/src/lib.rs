//! # apikit
//!
//! Shared HTTP contract pieces for the pricing and forecast API:
//! the error taxonomy and its JSON error envelope, the success envelope
//! builder, the boundary middleware that keeps every failure in the same
//! shape, and a validated query extractor.

pub use async_trait::async_trait;

pub mod api;
pub mod contracts;

pub use api::catalog::ErrDef;
pub use api::envelope::{Envelope, VersionInfo};
pub use api::error::{ApiError, ApiResult};
pub use api::error_layer::error_mapping_middleware;
pub use api::problem::{ErrorBody, ErrorResponse};
pub use api::query::ValidQuery;
pub use api::request_id::XRequestId;
pub use contracts::{ReadinessProbe, ReadinessReport};

pub use query_core::{Page, PageLimits, PageRequest, PaginationMeta, SortOrder, SortSpec};
