// # IP Source Trait
//
// Defines the interface for observing the caller's public IPv4 address.
//
// ## Implementations
//
// - HTTP oracle (ipify-style JSON): `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let current_ip = source.current().await?;
//     println!("public address: {current_ip}");
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for IP source implementations
///
/// An IP source is a black-box oracle: one call, one answer. It is called
/// once per run by `DdnsEngine`.
///
/// # Trust Level: Semi-Trusted
///
/// ## Allowed Capabilities
/// - ✅ Perform one outbound request per call
/// - ✅ Parse the oracle's response format
///
/// ## Forbidden Capabilities
/// - ❌ Perform DNS updates (use `DnsProvider`)
/// - ❌ Implement retry logic (owned by `DdnsEngine`)
/// - ❌ Cache the answer between calls
///
/// Errors must be classified: network failures, timeouts and 5xx answers
/// are `Error::Transient` so the engine can retry them; a malformed answer
/// is permanent.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The address the oracle observed for the caller
    /// - `Err(Error)`: If unable to determine it
    async fn current(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
