// # DNS Provider Trait
//
// Defines the interface for reading zones and records and updating records
// via provider APIs.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let zones = provider.list_zones().await?;
//     let records = provider.list_records(&zones[0].id, "home.example.com").await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A provider-side zone (one registrable domain)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Registrable root domain, e.g. `example.co.uk`
    pub name: String,
    /// Provider-assigned opaque identifier
    pub id: String,
}

/// DNS record type
///
/// Only `A` is acted upon; the others are decoded so they can be skipped
/// deliberately.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    Aaaa,
    /// Anything else (CNAME, TXT, ...)
    Other(String),
}

impl From<String> for RecordType {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "A" => Self::A,
            "AAAA" => Self::Aaaa,
            _ => Self::Other(value),
        }
    }
}

impl From<RecordType> for String {
    fn from(value: RecordType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::Aaaa => f.write_str("AAAA"),
            Self::Other(other) => f.write_str(other),
        }
    }
}

/// A DNS record as listed by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// The record ID (provider-specific)
    pub id: String,
    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// The exact (sub)domain name
    pub name: String,
    /// Current value (an address for A/AAAA)
    pub content: String,
}

/// Body of a record update request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    /// Record type, preserved from the existing record
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Record name, preserved from the existing record
    pub name: String,
    /// New content
    pub content: String,
}

impl RecordUpdate {
    /// Build an update that keeps `record`'s type and name and replaces its content
    pub fn replacing_content(record: &DnsRecord, content: impl Into<String>) -> Self {
        Self {
            record_type: record.record_type.clone(),
            name: record.name.clone(),
            content: content.into(),
        }
    }
}

/// Provider's verdict on an update request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateResponse {
    /// Whether the provider applied the change
    pub success: bool,
    /// Provider error payloads
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
    /// Provider message payloads
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
}

/// Trait for DNS provider implementations
///
/// Each method is a single logical API call (zone listing may span pages).
/// Credentials are bound to the provider at construction and forwarded on
/// every call.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses into the typed models above
///
/// ## Forbidden Capabilities
/// - ❌ Implement retry logic or backoff (owned by `DdnsEngine`)
/// - ❌ Decide whether an update is needed (owned by `DdnsEngine`)
/// - ❌ Cache state beyond a single call
/// - ❌ Create records
///
/// ## Error Classification
///
/// - Rejected credentials (401/403) → `Error::Authentication`
/// - Timeouts, connection errors, 429 and 5xx → `Error::Transient`
/// - Anything else → a permanent error
///
/// A well-formed update response with `success: false` is **not** an error;
/// it is returned as `UpdateResponse` so the engine can report the payloads.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every zone owned by the authenticated account
    async fn list_zones(&self) -> Result<Vec<Zone>, crate::Error>;

    /// List records in `zone_id` whose name is exactly `name`
    async fn list_records(&self, zone_id: &str, name: &str)
    -> Result<Vec<DnsRecord>, crate::Error>;

    /// Replace record `record_id` in `zone_id` with `update`
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<UpdateResponse, crate::Error>;

    /// Get the provider name (for logging/debugging)
    ///
    /// # Returns
    ///
    /// A static string identifying the provider (e.g., "cloudflare")
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_decoding() {
        let record: DnsRecord = serde_json::from_value(serde_json::json!({
            "id": "r1",
            "type": "A",
            "name": "home.example.com",
            "content": "198.51.100.1",
            "ttl": 1,
            "proxied": false
        }))
        .unwrap();
        assert_eq!(record.record_type, RecordType::A);

        let other: RecordType = serde_json::from_value(serde_json::json!("CNAME")).unwrap();
        assert_eq!(other, RecordType::Other("CNAME".to_string()));

        let v6: RecordType = serde_json::from_value(serde_json::json!("AAAA")).unwrap();
        assert_eq!(v6, RecordType::Aaaa);
    }

    #[test]
    fn test_update_body_preserves_type_and_name() {
        let record = DnsRecord {
            id: "r1".to_string(),
            record_type: RecordType::A,
            name: "home.example.com".to_string(),
            content: "198.51.100.1".to_string(),
        };

        let body = serde_json::to_value(RecordUpdate::replacing_content(&record, "203.0.113.5")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "type": "A",
                "name": "home.example.com",
                "content": "203.0.113.5"
            })
        );
    }

    #[test]
    fn test_update_response_defaults() {
        let response: UpdateResponse =
            serde_json::from_value(serde_json::json!({ "success": true })).unwrap();
        assert!(response.success);
        assert!(response.errors.is_empty());
        assert!(response.messages.is_empty());
    }
}
