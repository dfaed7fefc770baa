//! Service configuration from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `ROBOT_PORT` | 8888 |
//! | `ROBOT_HOOK_PATH` | `/github-hook` |
//! | `ROBOT_WEBHOOK_SECRET` | required |
//! | `ROBOT_GITHUB_TOKEN` | required |
//! | `ROBOT_CLIENT_ID_HEADER` | unset (any `User-Agent` accepted) |
//! | `ROBOT_MAX_CONCURRENCY` | unset (unbounded) |
//! | `ROBOT_GITHUB_API_URL` | unset (`https://api.github.com`) |
//!
//! A value that does not parse is ignored with a warning and the default
//! applies.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::warn;

use crate::server::DEFAULT_HOOK_PATH;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8888;

pub const ENV_PORT: &str = "ROBOT_PORT";
pub const ENV_HOOK_PATH: &str = "ROBOT_HOOK_PATH";
pub const ENV_WEBHOOK_SECRET: &str = "ROBOT_WEBHOOK_SECRET";
pub const ENV_GITHUB_TOKEN: &str = "ROBOT_GITHUB_TOKEN";
pub const ENV_CLIENT_ID: &str = "ROBOT_CLIENT_ID_HEADER";
pub const ENV_MAX_CONCURRENCY: &str = "ROBOT_MAX_CONCURRENCY";
pub const ENV_API_URL: &str = "ROBOT_GITHUB_API_URL";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
}

/// Everything the template robot needs to start.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub port: u16,
    pub hook_path: String,
    pub webhook_secret: String,
    pub github_token: String,
    /// Expected `User-Agent` of webhook requests.
    pub client_id: Option<String>,
    /// Cap on concurrently running handlers.
    pub max_concurrency: Option<usize>,
    /// API base URI, for GitHub Enterprise.
    pub api_url: Option<String>,
}

impl ServiceConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of a
    /// variable or `None` if it is unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        Ok(ServiceConfig {
            port: parsed(ENV_PORT, var(ENV_PORT)).unwrap_or(DEFAULT_PORT),
            hook_path: var(ENV_HOOK_PATH)
                .map(normalize_path)
                .unwrap_or_else(|| DEFAULT_HOOK_PATH.to_string()),
            webhook_secret: required(ENV_WEBHOOK_SECRET)?,
            github_token: required(ENV_GITHUB_TOKEN)?,
            client_id: var(ENV_CLIENT_ID),
            max_concurrency: parsed(ENV_MAX_CONCURRENCY, var(ENV_MAX_CONCURRENCY))
                .filter(|max: &usize| *max > 0),
            api_url: var(ENV_API_URL),
        })
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("port", &self.port)
            .field("hook_path", &self.hook_path)
            .field("webhook_secret", &"<redacted>")
            .field("github_token", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("max_concurrency", &self.max_concurrency)
            .field("api_url", &self.api_url)
            .finish()
    }
}

fn parsed<T: FromStr>(name: &str, value: Option<String>) -> Option<T> {
    let value = value?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(variable = name, value = %value, "Ignoring unparsable value, using default");
            None
        }
    }
}

fn normalize_path(path: String) -> String {
    if path.starts_with('/') {
        path
    } else {
        format!("/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|name| vars.get(name).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [(ENV_WEBHOOK_SECRET, "s3cret"), (ENV_GITHUB_TOKEN, "ghp_x")];

    #[test]
    fn defaults_apply() {
        let config = config(&REQUIRED).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.hook_path, "/github-hook");
        assert_eq!(config.client_id, None);
        assert_eq!(config.max_concurrency, None);
        assert_eq!(config.api_url, None);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = config(&[(ENV_GITHUB_TOKEN, "ghp_x")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing(ENV_WEBHOOK_SECRET));
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let err = config(&[(ENV_WEBHOOK_SECRET, "s3cret"), (ENV_GITHUB_TOKEN, "  ")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing(ENV_GITHUB_TOKEN));
    }

    #[test]
    fn overrides_are_read() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            (ENV_PORT, "9000"),
            (ENV_HOOK_PATH, "hooks/github"),
            (ENV_CLIENT_ID, "Robot-Github-Access"),
            (ENV_MAX_CONCURRENCY, "16"),
            (ENV_API_URL, "https://ghe.example.com/api/v3"),
        ]);
        let config = config(&vars).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.hook_path, "/hooks/github");
        assert_eq!(config.client_id.as_deref(), Some("Robot-Github-Access"));
        assert_eq!(config.max_concurrency, Some(16));
        assert_eq!(config.api_url.as_deref(), Some("https://ghe.example.com/api/v3"));
    }

    #[test]
    fn unparsable_values_fall_back() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([(ENV_PORT, "eighty"), (ENV_MAX_CONCURRENCY, "0")]);
        let config = config(&vars).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.max_concurrency, None);
    }

    #[test]
    fn debug_redacts_credentials() {
        let rendered = format!("{:?}", config(&REQUIRED).unwrap());
        assert!(!rendered.contains("s3cret"));
        assert!(!rendered.contains("ghp_x"));
    }
}
