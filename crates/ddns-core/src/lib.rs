// # ddns-core
//
// Core library for the one-shot DDNS A-record synchronizer.
//
// ## Architecture Overview
//
// This library provides the core functionality for dynamic DNS updates:
// - **IpSource**: Trait for observing the caller's public IPv4 address
// - **DnsProvider**: Trait for listing zones/records and updating records
// - **DdnsEngine**: Runs one pass: IP lookup, then resolve → locate → reconcile per domain
// - **DdnsConfig**: Explicit configuration, loaded once from the environment
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from HTTP implementations
// 2. **Library-First**: The binary is a thin wrapper around `DdnsEngine::run_once`
// 3. **Idempotency**: A record whose content already matches is never written
// 4. **Isolation**: One domain's failure never stops the others
// 5. **Engine-Owned Retries**: Providers and IP sources make single attempts

pub mod traits;
pub mod engine;
pub mod config;
pub mod domain;
pub mod error;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider};
pub use engine::{DdnsEngine, EngineEvent, ReconcileOutcome, RunSummary};
pub use config::{Credentials, DdnsConfig, EngineConfig};
pub use error::{Error, Result};
