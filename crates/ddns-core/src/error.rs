//! Error types for the DDNS system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// IP oracle errors that are not worth retrying (bad body, wrong family)
    #[error("IP source error: {0}")]
    IpSource(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure below the HTTP layer, timeouts, 5xx and 429 responses
    #[error("Transient network error: {0}")]
    Transient(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success HTTP status that is neither auth nor transient
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The registrable domain is not among the account's zones
    #[error("Zone not managed by this account: {domain} (available: {})", available.join(", "))]
    ZoneNotManaged {
        /// Root domain that was looked up
        domain: String,
        /// Zone names the account does own
        available: Vec<String>,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create an IP source error
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a transient network error
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a "zone not managed" error
    pub fn zone_not_managed(domain: impl Into<String>, available: Vec<String>) -> Self {
        Self::ZoneNotManaged {
            domain: domain.into(),
            available,
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether retrying the same call later could succeed
    ///
    /// Only `Transient` qualifies. Everything else is a permanent answer
    /// from the remote side or a local mistake.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Whether this error came from rejected credentials
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(Error::transient("timed out").is_transient());
        assert!(!Error::auth("bad key").is_transient());
        assert!(!Error::http("400 Bad Request").is_transient());
        assert!(!Error::ip_source("not an address").is_transient());
    }

    #[test]
    fn test_zone_not_managed_lists_available_zones() {
        let err = Error::zone_not_managed(
            "example.org",
            vec!["example.com".to_string(), "example.net".to_string()],
        );

        let msg = err.to_string();
        assert!(msg.contains("example.org"));
        assert!(msg.contains("example.com, example.net"));
    }

    #[test]
    fn test_auth_classification() {
        assert!(Error::auth("403 Forbidden").is_auth());
        assert!(!Error::config("missing").is_auth());
    }
}
