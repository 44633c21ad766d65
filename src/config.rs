use std::path::PathBuf;

use crate::errors::ConfigError;
use crate::session::{Endpoints, SubmitFailurePolicy};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// JSON file backing the session store; in-memory when `None`.
    pub store_path: Option<PathBuf>,
    pub endpoints: Endpoints,
    pub submit_failure_policy: SubmitFailurePolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            store_path: None,
            endpoints: Endpoints::default(),
            submit_failure_policy: SubmitFailurePolicy::default(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        for (flag, value) in [
            ("--submit-endpoint", &self.endpoints.submit),
            ("--calc-endpoint", &self.endpoints.calculator),
        ] {
            if !is_http_url(value) {
                return Err(ConfigError::InvalidEndpoint {
                    flag,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}

fn is_http_url(value: &str) -> bool {
    match reqwest::Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}
