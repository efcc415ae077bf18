// # HTTP IP Source
//
// This crate asks an external HTTP "what is my IP" oracle for the caller's
// public IPv4 address.
//
// ## Protocol
//
// One GET per call. The oracle answers either with JSON of the form
// `{"ip": "203.0.113.5"}` (ipify with `?format=json`) or with the bare
// address as plain text (ipify without `format`, icanhazip, ifconfig.me).
//
// ## Error Classification
//
// - Connect failure, timeout, 429, 5xx: `Error::Transient` (engine retries)
// - Any other status, unparsable body, IPv6 answer: `Error::IpSource`

use async_trait::async_trait;
use ddns_core::config::DdnsConfig;
use ddns_core::traits::IpSource;
use ddns_core::{Error, Result};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// JSON answer of ipify-style oracles
#[derive(Debug, Deserialize)]
struct OracleAnswer {
    ip: String,
}

/// Extract an IPv4 address from an oracle response body
///
/// JSON is tried first, then the trimmed body as plain text.
fn parse_ipv4(body: &str) -> Result<Ipv4Addr> {
    let text = match serde_json::from_str::<OracleAnswer>(body) {
        Ok(answer) => answer.ip,
        Err(_) => body.trim().to_string(),
    };

    match text.trim().parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => Ok(ip),
        Ok(IpAddr::V6(ip)) => Err(Error::ip_source(format!(
            "IP oracle returned an IPv6 address: {ip}"
        ))),
        Err(_) => Err(Error::ip_source(format!(
            "IP oracle returned an unparsable answer: {:?}",
            truncate(body, 64)
        ))),
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// HTTP IP oracle client
///
/// # Trust Level: Semi-Trusted
///
/// Stateless: every `current()` call performs exactly one request.
#[derive(Debug)]
pub struct HttpIpSource {
    /// Oracle URL
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new oracle client
    ///
    /// # Parameters
    ///
    /// - `url`: Oracle URL (e.g., "https://api.ipify.org?format=json")
    /// - `timeout`: Timeout for the whole request
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create an oracle client from the run configuration
    pub fn from_config(config: &DdnsConfig) -> Result<Self> {
        Self::new(config.ip_oracle_url.clone(), config.engine.request_timeout())
    }

    /// Oracle URL this source queries
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        tracing::debug!("Querying IP oracle at {}", self.url);

        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() || e.is_request() {
                Error::transient(format!("IP oracle request failed: {e}"))
            } else {
                Error::ip_source(format!("IP oracle request failed: {e}"))
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(Error::transient(format!("IP oracle unavailable: {status}")));
        }
        if !status.is_success() {
            return Err(Error::ip_source(format!("IP oracle HTTP error: {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::transient(format!("Failed to read IP oracle response: {e}")))?;

        parse_ipv4(&body)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
