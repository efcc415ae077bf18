//! Configuration types for the DDNS system
//!
//! This module defines all configuration structures used throughout the crate.
//! Configuration is built once (usually from the environment) and passed into
//! the engine; no component reads the environment on its own.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cloudflare API v4 base URL
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default public-IP oracle, answers `{"ip":"203.0.113.5"}`
pub const DEFAULT_IP_ORACLE_URL: &str = "https://api.ipify.org?format=json";

/// Environment variable names
pub mod env_keys {
    /// Comma-separated list of (sub)domains to keep in sync
    pub const DOMAIN_NAMES: &str = "DOMAIN_NAMES";
    /// Provider account e-mail
    pub const ACCOUNT_EMAIL: &str = "ACCOUNT_EMAIL";
    /// Provider API key
    pub const API_KEY: &str = "API_KEY";
    /// IP oracle URL override
    pub const IP_ORACLE_URL: &str = "DDNS_IP_ORACLE_URL";
    /// Provider API base URL override
    pub const API_BASE: &str = "DDNS_API_BASE";
    /// Per-request timeout in seconds
    pub const HTTP_TIMEOUT_SECS: &str = "DDNS_HTTP_TIMEOUT_SECS";
    /// Maximum retries for transient failures
    pub const MAX_RETRIES: &str = "DDNS_MAX_RETRIES";
    /// Base retry delay in milliseconds
    pub const RETRY_DELAY_MS: &str = "DDNS_RETRY_DELAY_MS";
    /// `live` or `dry-run`
    pub const MODE: &str = "DDNS_MODE";
}

/// Main DDNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Fully-qualified domains whose A records are kept in sync, in order
    pub domains: Vec<String>,

    /// Provider credentials
    pub credentials: Credentials,

    /// IP oracle endpoint
    #[serde(default = "default_ip_oracle_url")]
    pub ip_oracle_url: String,

    /// Provider API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// If true, perform all reads but skip record updates
    #[serde(default)]
    pub dry_run: bool,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DdnsConfig {
    /// Create a configuration with default tuning
    pub fn new(
        domains: Vec<String>,
        account_email: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            domains,
            credentials: Credentials::new(account_email, api_key),
            ip_oracle_url: default_ip_oracle_url(),
            api_base: default_api_base(),
            dry_run: false,
            engine: EngineConfig::default(),
        }
    }

    /// Load configuration from the process environment
    pub fn from_env() -> crate::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Missing required variables are reported all at once. The result is
    /// validated before it is returned.
    pub fn from_vars<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let domains: Vec<String> = get(env_keys::DOMAIN_NAMES)
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let account_email = get(env_keys::ACCOUNT_EMAIL);
        let api_key = get(env_keys::API_KEY);

        let mut missing = Vec::new();
        if domains.is_empty() {
            missing.push(env_keys::DOMAIN_NAMES);
        }
        if account_email.is_none() {
            missing.push(env_keys::ACCOUNT_EMAIL);
        }
        if api_key.is_none() {
            missing.push(env_keys::API_KEY);
        }
        if !missing.is_empty() {
            return Err(crate::Error::config(format!(
                "Missing required environment variable(s): {}",
                missing.join(", ")
            )));
        }

        let mut config = Self::new(
            domains,
            account_email.unwrap_or_default(),
            api_key.unwrap_or_default(),
        );

        if let Some(url) = get(env_keys::IP_ORACLE_URL) {
            config.ip_oracle_url = url;
        }
        if let Some(base) = get(env_keys::API_BASE) {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(secs) = get(env_keys::HTTP_TIMEOUT_SECS) {
            config.engine.request_timeout_secs = parse_number(env_keys::HTTP_TIMEOUT_SECS, &secs)?;
        }
        if let Some(retries) = get(env_keys::MAX_RETRIES) {
            config.engine.max_retries = parse_number(env_keys::MAX_RETRIES, &retries)?;
        }
        if let Some(delay) = get(env_keys::RETRY_DELAY_MS) {
            config.engine.retry_delay_ms = parse_number(env_keys::RETRY_DELAY_MS, &delay)?;
        }
        if let Some(mode) = get(env_keys::MODE) {
            config.dry_run = match mode.to_lowercase().as_str() {
                "live" => false,
                "dry-run" => true,
                other => {
                    return Err(crate::Error::config(format!(
                        "{} '{}' is not valid. Valid modes: live, dry-run",
                        env_keys::MODE,
                        other
                    )));
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.domains.is_empty() {
            return Err(crate::Error::config("No domains configured"));
        }

        for domain in &self.domains {
            crate::domain::validate_domain_name(domain)?;
        }

        self.credentials.validate()?;

        for (name, url) in [("IP oracle URL", &self.ip_oracle_url), ("API base URL", &self.api_base)] {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(crate::Error::config(format!(
                    "{name} must use HTTP or HTTPS scheme. Got: {url}"
                )));
            }
        }

        self.engine.validate()
    }
}

/// Provider credentials, forwarded verbatim as request headers
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Account e-mail (`X-Auth-Email`)
    pub account_email: String,

    /// API key (`X-Auth-Key`)
    /// ⚠️ NEVER log this value
    pub api_key: String,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("account_email", &self.account_email)
            .field("api_key", &"<REDACTED>")
            .finish()
    }
}

impl Credentials {
    /// Header carrying the account e-mail
    pub const EMAIL_HEADER: &'static str = "X-Auth-Email";

    /// Header carrying the API key
    pub const KEY_HEADER: &'static str = "X-Auth-Key";

    /// Create a credential set
    pub fn new(account_email: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            account_email: account_email.into(),
            api_key: api_key.into(),
        }
    }

    /// Header name/value pairs sent with every provider call
    pub fn headers(&self) -> [(&'static str, &str); 2] {
        [
            (Self::EMAIL_HEADER, self.account_email.as_str()),
            (Self::KEY_HEADER, self.api_key.as_str()),
        ]
    }

    /// Both values must be present
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.account_email.trim().is_empty() {
            return Err(crate::Error::config("Account e-mail cannot be empty"));
        }
        if self.api_key.trim().is_empty() {
            return Err(crate::Error::config("API key cannot be empty"));
        }
        Ok(())
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of retry attempts for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Base delay between retry attempts (in milliseconds), doubled per attempt
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Timeout applied to every outbound HTTP request (in seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Per-request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn retry_delay(&self, attempt: usize) -> Duration {
        let factor = 1u64 << attempt.min(16);
        Duration::from_millis(self.retry_delay_ms.saturating_mul(factor))
    }

    /// Validate numeric ranges
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !(1..=60).contains(&self.request_timeout_secs) {
            return Err(crate::Error::config(format!(
                "Request timeout must be between 1 and 60 seconds. Got: {}",
                self.request_timeout_secs
            )));
        }
        if self.max_retries > 10 {
            return Err(crate::Error::config(format!(
                "Max retries must be between 0 and 10. Got: {}",
                self.max_retries
            )));
        }
        if self.retry_delay_ms > 60_000 {
            return Err(crate::Error::config(format!(
                "Retry delay must be between 0 and 60000 ms. Got: {}",
                self.retry_delay_ms
            )));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, crate::Error> {
    value
        .parse()
        .map_err(|_| crate::Error::config(format!("{key} must be a non-negative integer. Got: {value}")))
}

fn default_ip_oracle_url() -> String {
    DEFAULT_IP_ORACLE_URL.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_max_retries() -> usize {
    2
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_request_timeout_secs() -> u64 {
    6
}

fn default_event_channel_capacity() -> usize {
    256
}
