pub mod catalog;
pub mod envelope;
pub mod error;
pub mod error_layer;
pub mod problem;
pub mod query;
pub mod request_id;
