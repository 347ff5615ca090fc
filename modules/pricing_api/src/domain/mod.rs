pub mod catalog;
pub mod error;
pub mod plain_language;
pub mod service;
pub mod view;
