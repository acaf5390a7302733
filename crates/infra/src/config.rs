//! Environment-driven configuration.

use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

use dealerdesk_catalog::MissingRulePolicy;
use dealerdesk_configurator::StockPolicy;
use dealerdesk_observability::LogFormat;

pub const ENV_API_URL: &str = "DEALERDESK_API_URL";
pub const ENV_AUTH_TOKEN: &str = "DEALERDESK_AUTH_TOKEN";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "DEALERDESK_HTTP_TIMEOUT_SECS";
pub const ENV_MISSING_RULE_POLICY: &str = "DEALERDESK_MISSING_RULE_POLICY";
pub const ENV_STOCK_POLICY: &str = "DEALERDESK_STOCK_POLICY";
pub const ENV_LOG_FORMAT: &str = "DEALERDESK_LOG_FORMAT";

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {key}: {message}")]
pub struct ConfigError {
    pub key: &'static str,
    pub message: String,
}

impl ConfigError {
    fn new(key: &'static str, message: impl ToString) -> Self {
        Self {
            key,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub api_url: Url,
    pub auth_token: Option<String>,
    pub http_timeout: Duration,
    pub missing_rule_policy: MissingRulePolicy,
    pub stock_policy: StockPolicy,
    pub log_format: LogFormat,
}

impl PortalConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup` (unset and blank values fall
    /// back to defaults).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = match get(ENV_API_URL) {
            Some(raw) => parse_api_url(&raw)?,
            None => parse_api_url(DEFAULT_API_URL)?,
        };

        let http_timeout = match get(ENV_HTTP_TIMEOUT_SECS) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => return Err(ConfigError::new(ENV_HTTP_TIMEOUT_SECS, "must be positive")),
                Ok(secs) => Duration::from_secs(secs),
                Err(e) => return Err(ConfigError::new(ENV_HTTP_TIMEOUT_SECS, e)),
            },
            None => DEFAULT_HTTP_TIMEOUT,
        };

        let missing_rule_policy = get(ENV_MISSING_RULE_POLICY)
            .map(|raw| raw.parse::<MissingRulePolicy>())
            .transpose()
            .map_err(|e| ConfigError::new(ENV_MISSING_RULE_POLICY, e))?
            .unwrap_or_default();

        let stock_policy = get(ENV_STOCK_POLICY)
            .map(|raw| raw.parse::<StockPolicy>())
            .transpose()
            .map_err(|e| ConfigError::new(ENV_STOCK_POLICY, e))?
            .unwrap_or_default();

        let log_format = get(ENV_LOG_FORMAT)
            .map(|raw| raw.parse::<LogFormat>())
            .transpose()
            .map_err(|e| ConfigError::new(ENV_LOG_FORMAT, e))?
            .unwrap_or_default();

        Ok(Self {
            api_url,
            auth_token: get(ENV_AUTH_TOKEN),
            http_timeout,
            missing_rule_policy,
            stock_policy,
            log_format,
        })
    }
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::new(ENV_API_URL, e))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::new(ENV_API_URL, "expected an http(s) base URL"));
    }
    Ok(url)
}
