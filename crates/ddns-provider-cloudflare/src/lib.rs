// # Cloudflare DNS Provider
//
// This crate provides a Cloudflare DNS provider implementation for the DDNS system.
//
// ## Scope
//
// - One logical API call per trait method (zone listing follows pages)
// - Every response decoded into typed envelopes at this boundary
// - Per-request timeout from configuration
// - Errors classified for the engine: auth, transient, permanent
// - ❌ NO retry logic (owned by DdnsEngine)
// - ❌ NO idempotency decision (owned by DdnsEngine)
// - ❌ NO record creation
//
// ## Security Requirements
//
// - API key NEVER appears in logs
// - Provider MUST fail fast if credentials are empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?page=N&per_page=50`
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`
//
// Authentication uses the global API key: `X-Auth-Email` + `X-Auth-Key`.

use async_trait::async_trait;
use ddns_core::config::{Credentials, DdnsConfig};
use ddns_core::traits::{DnsProvider, DnsRecord, RecordUpdate, UpdateResponse, Zone};
use ddns_core::{Error, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Zones requested per page
const ZONES_PER_PAGE: u32 = 50;

/// Upper bound on zone pages followed in one listing
const MAX_ZONE_PAGES: u32 = 200;

/// Cloudflare error codes that mean the credentials were not accepted
///
/// Cloudflare answers some malformed or unknown keys with 400 rather than 403.
const AUTH_ERROR_CODES: &[i64] = &[6003, 6103, 6111, 9103, 9106, 9109, 10000];

/// Standard Cloudflare v4 response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
    #[serde(default)]
    messages: Vec<serde_json::Value>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

/// Pagination block of list responses
#[derive(Debug, Clone, Copy, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    total_pages: u32,
}

/// Whether another zone page should be fetched after `page`
fn has_more_pages(info: Option<ResultInfo>, page: u32, returned: usize) -> bool {
    match info {
        Some(info) if info.total_pages > 0 => info.page.max(page) < info.total_pages,
        _ => returned >= ZONES_PER_PAGE as usize,
    }
}

/// Whether any error payload carries an authentication error code
fn has_auth_error_code(errors: &[serde_json::Value]) -> bool {
    errors
        .iter()
        .filter_map(|e| e.get("code").and_then(serde_json::Value::as_i64))
        .any(|code| AUTH_ERROR_CODES.contains(&code))
}

/// Map a non-success status to an engine-facing error
fn classify_status(status: StatusCode, body: &str, context: &str) -> Error {
    let errors = serde_json::from_str::<Envelope<serde_json::Value>>(body)
        .map(|e| e.errors)
        .unwrap_or_default();

    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "{context}: invalid credentials or insufficient permissions. Status: {status}"
        )),
        400 if has_auth_error_code(&errors) => Error::auth(format!(
            "{context}: credentials rejected. Status: {status} - {body}"
        )),
        429 => Error::transient(format!(
            "{context}: rate limit exceeded. Status: {status}"
        )),
        500..=599 => Error::transient(format!(
            "{context}: Cloudflare server error: {status} - {body}"
        )),
        _ => Error::http(format!("{context} failed: {status} - {body}")),
    }
}

/// Map a transport-level failure to an engine-facing error
fn classify_send_error(err: &reqwest::Error, context: &str) -> Error {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        Error::transient(format!("{context}: HTTP request failed: {err}"))
    } else {
        Error::http(format!("{context}: HTTP request failed: {err}"))
    }
}

/// Cloudflare DNS provider
///
/// # Trust Level: Untrusted
///
/// This provider is isolated, stateless, and single-shot. All coordination
/// (retries, backoff, idempotency) is owned by `DdnsEngine`.
pub struct CloudflareProvider {
    /// Account e-mail and API key
    /// ⚠️ NEVER log the key
    credentials: Credentials,

    /// API base URL, no trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Debug delegates to Credentials, which redacts the key
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("credentials", &self.credentials)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `credentials`: Account e-mail and global API key
    /// - `api_base`: API base URL (normally `https://api.cloudflare.com/client/v4`)
    /// - `timeout`: Timeout applied to every request
    ///
    /// # Errors
    ///
    /// Fails if either credential is empty or the HTTP client cannot be built.
    pub fn new(credentials: Credentials, api_base: impl Into<String>, timeout: Duration) -> Result<Self> {
        credentials.validate()?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            credentials,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a provider from the run configuration
    pub fn from_config(config: &DdnsConfig) -> Result<Self> {
        Self::new(
            config.credentials.clone(),
            config.api_base.clone(),
            config.engine.request_timeout(),
        )
    }

    fn zones_url(&self) -> String {
        format!("{}/zones", self.api_base)
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.api_base, zone_id)
    }

    fn record_url(&self, zone_id: &str, record_id: &str) -> String {
        format!("{}/zones/{}/dns_records/{}", self.api_base, zone_id, record_id)
    }

    /// Attach the auth header set
    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        self.credentials
            .headers()
            .into_iter()
            .fold(builder, |b, (name, value)| b.header(name, value))
    }

    /// Send a request and return status plus body text
    async fn send(&self, builder: reqwest::RequestBuilder, context: &str) -> Result<(StatusCode, String)> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| classify_send_error(&e, context))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_send_error(&e, context))?;

        Ok((status, body))
    }

    /// GET a list endpoint and decode its envelope
    ///
    /// With `refusal_is_auth`, every refusal that is not worth retrying (a
    /// non-2xx status other than 429/5xx, or `success: false`) is reported
    /// as `Error::Authentication`.
    async fn get_envelope<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        context: &str,
        refusal_is_auth: bool,
    ) -> Result<Envelope<T>> {
        let (status, body) = self.send(self.client.get(url).query(query), context).await?;

        if !status.is_success() {
            let err = classify_status(status, &body, context);
            if refusal_is_auth && !err.is_transient() && !err.is_auth() {
                return Err(Error::auth(format!("{context} refused: {status} - {body}")));
            }
            return Err(err);
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)?;

        if !envelope.success {
            let message = format!("{context}: request unsuccessful: {:?}", envelope.errors);
            return Err(if refusal_is_auth || has_auth_error_code(&envelope.errors) {
                Error::auth(message)
            } else {
                Error::provider("cloudflare", message)
            });
        }

        Ok(envelope)
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// List every zone visible to the credentials
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones?page=1&per_page=50
    /// X-Auth-Email: <email>
    /// X-Auth-Key: <key>
    /// ```
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        let url = self.zones_url();
        let mut zones = Vec::new();
        let mut page = 1;

        loop {
            let envelope: Envelope<Vec<Zone>> = self
                .get_envelope(
                    &url,
                    &[("page", page.to_string()), ("per_page", ZONES_PER_PAGE.to_string())],
                    "Zone listing",
                    true,
                )
                .await?;

            let batch = envelope.result.unwrap_or_default();
            let returned = batch.len();
            zones.extend(batch);

            if !has_more_pages(envelope.result_info, page, returned) {
                break;
            }
            if page >= MAX_ZONE_PAGES {
                tracing::warn!("Stopping zone listing after {} pages", MAX_ZONE_PAGES);
                break;
            }
            page += 1;
        }

        tracing::debug!("Listed {} zone(s) over {} page(s)", zones.len(), page);
        Ok(zones)
    }

    /// List records named exactly `name`
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?name=home.example.com
    /// ```
    async fn list_records(&self, zone_id: &str, name: &str) -> Result<Vec<DnsRecord>> {
        tracing::debug!("Looking up records named {} in zone {}", name, zone_id);

        let envelope: Envelope<Vec<DnsRecord>> = self
            .get_envelope(
                &self.records_url(zone_id),
                &[("name", name.to_string())],
                "Record listing",
                false,
            )
            .await?;

        Ok(envelope.result.unwrap_or_default())
    }

    /// Replace a record
    ///
    /// A well-formed `success: false` answer is returned, not raised, so the
    /// engine can report Cloudflare's `errors` and `messages`.
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// { "type": "A", "name": "home.example.com", "content": "203.0.113.5" }
    /// ```
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<UpdateResponse> {
        let context = "Record update";
        let url = self.record_url(zone_id, record_id);

        tracing::debug!("Sending PUT for record {} in zone {}", record_id, zone_id);
        let (status, body) = self.send(self.client.put(&url).json(update), context).await?;

        let failure = if status.is_success() {
            None
        } else {
            let err = classify_status(status, &body, context);
            if err.is_auth() || err.is_transient() {
                return Err(err);
            }
            Some(err)
        };

        // Anything else with a readable envelope is a refusal, not an error
        match serde_json::from_str::<Envelope<serde_json::Value>>(&body) {
            Ok(envelope) => Ok(UpdateResponse {
                success: envelope.success && failure.is_none(),
                errors: envelope.errors,
                messages: envelope.messages,
            }),
            Err(e) => Err(failure.unwrap_or_else(|| {
                Error::provider("cloudflare", format!("{context}: failed to parse response: {e}"))
            })),
        }
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
