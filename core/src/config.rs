//! # Client configuration
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `WARRANTY_API_BASE_URL` | Prefix joined with every endpoint path | Required |
//! | `WARRANTY_API_TIMEOUT_SECS` | Per-request transport timeout | none |
//! | `WARRANTY_AUTH_EXEMPT_PATHS` | Comma separated path fragments sent without a bearer token | `auth/login,auth/register,auth/refresh` |

use std::time::Duration;

use crate::error::ConfigError;
use crate::interceptor::DEFAULT_AUTH_EXEMPT_PATHS;

pub const BASE_URL_ENV: &str = "WARRANTY_API_BASE_URL";
pub const TIMEOUT_SECS_ENV: &str = "WARRANTY_API_TIMEOUT_SECS";
pub const AUTH_EXEMPT_PATHS_ENV: &str = "WARRANTY_AUTH_EXEMPT_PATHS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
    pub auth_exempt_paths: Vec<String>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
            auth_exempt_paths: DEFAULT_AUTH_EXEMPT_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(BASE_URL_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing(BASE_URL_ENV))?;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: BASE_URL_ENV,
                reason: format!("expected an http(s) URL, got {base_url:?}"),
            });
        }

        let mut config = Self::new(base_url);

        if let Some(raw) = lookup(TIMEOUT_SECS_ENV) {
            let secs: u64 = raw.trim().parse().map_err(|e| ConfigError::Invalid {
                name: TIMEOUT_SECS_ENV,
                reason: format!("{e}"),
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        if let Some(raw) = lookup(AUTH_EXEMPT_PATHS_ENV) {
            config.auth_exempt_paths = raw
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(config)
    }
}
