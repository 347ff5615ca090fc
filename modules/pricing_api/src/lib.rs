// === PUBLIC CONTRACT ===
pub mod contract;
pub use contract::{error, model, source};

pub mod config;
pub use config::{PricingApiConfig, TableNames};

// === INTERNAL MODULES ===
// Exposed for integration tests and the server binary's wiring.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
