//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Observe the caller's public IPv4 address
//! - [`DnsProvider`]: Read zones and records, update records via provider APIs

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::IpSource;
pub use dns_provider::{DnsProvider, DnsRecord, RecordType, RecordUpdate, UpdateResponse, Zone};
