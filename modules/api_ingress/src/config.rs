use serde::{Deserialize, Serialize};

/// HTTP host settings, read from `modules.api_ingress`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiIngressConfig {
    pub cors_enabled: bool,
    /// Origins allowed when CORS is enabled; empty means any origin.
    pub allowed_origins: Vec<String>,
    pub request_timeout_sec: u64,
    pub body_limit_bytes: usize,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            cors_enabled: false,
            allowed_origins: Vec::new(),
            request_timeout_sec: 30,
            body_limit_bytes: 16 * 1024 * 1024,
        }
    }
}
