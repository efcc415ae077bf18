//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Observing the public IP once per run via IpSource
//! - Resolving each configured domain to its provider zone
//! - Locating the domain's A record
//! - Updating the record only when its content differs from the observed IP
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  IpSource   │──── Ipv4Addr (once) ───┐
//! └─────────────┘                        │
//!                                        ▼
//!                               ┌──────────────┐
//!                               │ DdnsEngine   │── for each domain, in order
//!                               └──────────────┘
//!                                        │
//!         ┌──────────────────────────────┼──────────────────────────┐
//!         │                              │                          │
//!         ▼                              ▼                          ▼
//! ┌──────────────┐             ┌──────────────────┐        ┌──────────────┐
//! │ resolve_zone │────────────▶│  find_a_record   │───────▶│  reconcile   │
//! │ (list zones) │             │ (list records)   │        │ (update)     │
//! └──────────────┘             └──────────────────┘        └──────────────┘
//! ```
//!
//! ## Run Flow
//!
//! 1. Fetch the external IP (failure aborts the run)
//! 2. For each domain: derive root domain, look up zone, find A record
//! 3. If the record content differs, call DnsProvider::update_record()
//! 4. Record an outcome per domain; one domain's failure never stops the next
//! 5. Emit events for monitoring/logging

mod zones;

pub use zones::ZoneIndex;

use crate::config::{DdnsConfig, EngineConfig};
use crate::domain;
use crate::error::Result;
use crate::traits::{DnsProvider, DnsRecord, IpSource, RecordType, RecordUpdate, Zone};
use std::future::Future;
use std::net::Ipv4Addr;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Run started
    RunStarted {
        domains_count: usize,
    },

    /// External IP observed
    IpObserved {
        ip: Ipv4Addr,
    },

    /// Domain mapped to a provider zone
    ZoneResolved {
        domain: String,
        zone_name: String,
        zone_id: String,
    },

    /// Record content replaced
    RecordUpdated {
        domain: String,
        previous: String,
        new_ip: Ipv4Addr,
        dry_run: bool,
    },

    /// Record already had the observed IP
    RecordUnchanged {
        domain: String,
        ip: Ipv4Addr,
    },

    /// No A record exists for the domain
    RecordMissing {
        domain: String,
    },

    /// No address was available to compare against
    AddressMissing {
        domain: String,
    },

    /// Provider answered the update with `success: false`
    UpdateRejected {
        domain: String,
        errors: Vec<String>,
        messages: Vec<String>,
    },

    /// Domain could not be processed
    DomainFailed {
        domain: String,
        error: String,
    },

    /// Run finished
    RunFinished {
        updated: usize,
        unchanged: usize,
        failed: usize,
    },
}

/// Why reconciliation decided not to write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    /// There is no A record to update
    NoRecord,
    /// No address was observed
    NoAddress,
    /// Record content already equals the observed address
    AlreadyCurrent,
}

/// Result of reconciling one record against the observed IP
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// Record content was replaced (or would have been, in dry-run mode)
    Updated {
        /// Content before the update
        previous: String,
        /// Content after the update
        new_ip: Ipv4Addr,
        /// The update request was not actually sent
        dry_run: bool,
    },

    /// Nothing to do
    NoOpNeeded(NoOpReason),

    /// Provider refused the update
    UpdateFailed {
        /// Provider error payloads
        errors: Vec<serde_json::Value>,
        /// Provider message payloads
        messages: Vec<serde_json::Value>,
    },
}

/// Outcome for a single configured domain
#[derive(Debug)]
pub struct DomainReport {
    /// Domain as configured
    pub domain: String,
    /// Reconciliation outcome, or the error that stopped this domain
    pub result: Result<ReconcileOutcome>,
}

/// Outcome of one complete run
#[derive(Debug)]
pub struct RunSummary {
    /// IP observed at the start of the run
    pub ip: Ipv4Addr,
    /// One report per configured domain, in configuration order
    pub reports: Vec<DomainReport>,
}

impl RunSummary {
    /// Number of domains whose record was updated
    pub fn updated(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.result, Ok(ReconcileOutcome::Updated { .. })))
            .count()
    }

    /// Number of domains that needed no write
    pub fn unchanged(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.result, Ok(ReconcileOutcome::NoOpNeeded(_))))
            .count()
    }

    /// Number of domains that errored or whose update was rejected
    pub fn failed(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.result, Err(_) | Ok(ReconcileOutcome::UpdateFailed { .. })))
            .count()
    }

    /// Whether any domain failed because the credentials were rejected
    pub fn has_auth_failure(&self) -> bool {
        self.reports
            .iter()
            .any(|r| matches!(&r.result, Err(e) if e.is_auth()))
    }
}

/// Core DDNS engine
///
/// The engine runs once per invocation: it is built, `run_once()` is
/// awaited, and it is dropped. Scheduling is left to the caller.
///
/// ## Retry Policy
///
/// Transient failures (`Error::is_transient`) are retried up to
/// `max_retries` times with exponential backoff. Providers and IP sources
/// never retry on their own.
pub struct DdnsEngine {
    /// IP source for observing the public address
    ip_source: Box<dyn IpSource>,

    /// DNS provider for zone/record access
    provider: Box<dyn DnsProvider>,

    /// Domains to keep in sync, in order
    domains: Vec<String>,

    /// If true, updates are logged but not sent
    dry_run: bool,

    /// Retry and channel settings
    settings: EngineConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// The configuration is validated here, so an invalid configuration
    /// never reaches the network.
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            ip_source,
            provider,
            domains: config.domains,
            dry_run: config.dry_run,
            settings: config.engine,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run one synchronization pass over every configured domain
    ///
    /// # Returns
    ///
    /// - `Ok(RunSummary)`: Every domain was attempted; inspect the reports
    /// - `Err(Error)`: The external IP could not be determined, nothing was attempted
    pub async fn run_once(&self) -> Result<RunSummary> {
        self.emit_event(EngineEvent::RunStarted {
            domains_count: self.domains.len(),
        });
        info!(
            "Starting DDNS run for {} domain(s) [mode: {}]",
            self.domains.len(),
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        let ip = self
            .with_retry("external IP lookup", || self.ip_source.current())
            .await
            .inspect_err(|e| {
                error!("Unable to determine external IP via {}: {}", self.ip_source.source_name(), e);
            })?;
        info!("External IP: {} (via {})", ip, self.ip_source.source_name());
        self.emit_event(EngineEvent::IpObserved { ip });

        let mut zones = None;
        let mut reports = Vec::with_capacity(self.domains.len());

        for domain in &self.domains {
            let result = self.process_domain(domain, ip, &mut zones).await;
            self.report(domain, ip, &result);
            reports.push(DomainReport {
                domain: domain.clone(),
                result,
            });
        }

        let summary = RunSummary { ip, reports };
        info!(
            "DDNS run finished: {} updated, {} unchanged, {} failed",
            summary.updated(),
            summary.unchanged(),
            summary.failed()
        );
        self.emit_event(EngineEvent::RunFinished {
            updated: summary.updated(),
            unchanged: summary.unchanged(),
            failed: summary.failed(),
        });

        Ok(summary)
    }

    /// Resolve → locate → reconcile for one domain
    ///
    /// `zones` holds the account's zone listing for the rest of the run once
    /// it has been fetched successfully. A failed listing leaves it empty so
    /// the next domain asks again.
    async fn process_domain(
        &self,
        domain: &str,
        ip: Ipv4Addr,
        zones: &mut Option<ZoneIndex>,
    ) -> Result<ReconcileOutcome> {
        let root = domain::root_domain(domain)?;

        let index = match zones.take() {
            Some(index) => index,
            None => self.fetch_zone_index().await?,
        };
        let lookup = index.lookup(&root);
        *zones = Some(index);
        let zone = lookup?;
        debug!("Domain {} belongs to zone {} ({})", domain, zone.name, zone.id);
        self.emit_event(EngineEvent::ZoneResolved {
            domain: domain.to_string(),
            zone_name: zone.name.clone(),
            zone_id: zone.id.clone(),
        });

        let record = self.find_a_record(&zone.id, domain).await?;
        self.reconcile(record.as_ref(), Some(ip), &zone.id).await
    }

    /// Resolve the provider zone that owns `subdomain`
    ///
    /// Derives the registrable root domain, lists the account's zones and
    /// maps the root domain to its zone.
    ///
    /// # Returns
    ///
    /// - `Ok(Zone)`: The owning zone
    /// - `Err(Error::Authentication)`: Zone listing was refused
    /// - `Err(Error::ZoneNotManaged)`: The account has no such zone
    pub async fn resolve_zone(&self, subdomain: &str) -> Result<Zone> {
        let root = domain::root_domain(subdomain)?;
        self.fetch_zone_index().await?.lookup(&root)
    }

    async fn fetch_zone_index(&self) -> Result<ZoneIndex> {
        let zones = self
            .with_retry("zone listing", || self.provider.list_zones())
            .await?;
        let index = ZoneIndex::from_zones(zones);
        debug!("Account owns {} zone(s)", index.len());
        Ok(index)
    }

    /// Find the A record named exactly `subdomain` in `zone_id`
    ///
    /// The first A record in provider order wins; AAAA and other types are
    /// skipped. `None` means there is nothing to update.
    pub async fn find_a_record(&self, zone_id: &str, subdomain: &str) -> Result<Option<DnsRecord>> {
        let name = domain::normalize(subdomain);
        let records = self
            .with_retry("record listing", || self.provider.list_records(zone_id, &name))
            .await?;

        let mut a_records = records
            .into_iter()
            .filter(|r| r.record_type == RecordType::A && domain::normalize(&r.name) == name);
        let first = a_records.next();

        let extra = a_records.count();
        if extra > 0 {
            debug!("{} has {} additional A record(s); using the first", name, extra);
        }

        Ok(first)
    }

    /// Bring `record` in line with `new_ip`
    ///
    /// Never writes when there is no record, no address, or the content
    /// already matches. Otherwise issues exactly one update carrying the
    /// record's existing type and name.
    pub async fn reconcile(
        &self,
        record: Option<&DnsRecord>,
        new_ip: Option<Ipv4Addr>,
        zone_id: &str,
    ) -> Result<ReconcileOutcome> {
        let Some(record) = record else {
            return Ok(ReconcileOutcome::NoOpNeeded(NoOpReason::NoRecord));
        };
        let Some(new_ip) = new_ip else {
            return Ok(ReconcileOutcome::NoOpNeeded(NoOpReason::NoAddress));
        };

        if record.content.trim().parse::<Ipv4Addr>().ok() == Some(new_ip) {
            return Ok(ReconcileOutcome::NoOpNeeded(NoOpReason::AlreadyCurrent));
        }

        let update = RecordUpdate::replacing_content(record, new_ip.to_string());

        if self.dry_run {
            info!(
                "[DRY-RUN] Would update {} in zone {}: {} -> {}",
                record.name, zone_id, record.content, new_ip
            );
            return Ok(ReconcileOutcome::Updated {
                previous: record.content.clone(),
                new_ip,
                dry_run: true,
            });
        }

        let response = self
            .with_retry("record update", || {
                self.provider.update_record(zone_id, &record.id, &update)
            })
            .await?;

        if response.success {
            Ok(ReconcileOutcome::Updated {
                previous: record.content.clone(),
                new_ip,
                dry_run: false,
            })
        } else {
            Ok(ReconcileOutcome::UpdateFailed {
                errors: response.errors,
                messages: response.messages,
            })
        }
    }

    /// Run `op`, retrying transient failures with exponential backoff
    async fn with_retry<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.settings.max_retries => {
                    let delay = self.settings.retry_delay(attempt);
                    warn!(
                        "{} attempt {} failed: {}; retrying in {:?}",
                        what,
                        attempt + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Log and emit the outcome of one domain
    fn report(&self, domain: &str, ip: Ipv4Addr, result: &Result<ReconcileOutcome>) {
        match result {
            Ok(ReconcileOutcome::Updated {
                previous,
                new_ip,
                dry_run,
            }) => {
                info!(
                    "{} {}: {} -> {}",
                    if *dry_run { "Would update" } else { "Updated" },
                    domain,
                    previous,
                    new_ip
                );
                self.emit_event(EngineEvent::RecordUpdated {
                    domain: domain.to_string(),
                    previous: previous.clone(),
                    new_ip: *new_ip,
                    dry_run: *dry_run,
                });
            }
            Ok(ReconcileOutcome::NoOpNeeded(NoOpReason::AlreadyCurrent)) => {
                info!("{} is already up-to-date ({})", domain, ip);
                self.emit_event(EngineEvent::RecordUnchanged {
                    domain: domain.to_string(),
                    ip,
                });
            }
            Ok(ReconcileOutcome::NoOpNeeded(NoOpReason::NoRecord)) => {
                warn!("No A record found for {}; records are never created", domain);
                self.emit_event(EngineEvent::RecordMissing {
                    domain: domain.to_string(),
                });
            }
            Ok(ReconcileOutcome::NoOpNeeded(NoOpReason::NoAddress)) => {
                warn!("No address to publish for {}; record left untouched", domain);
                self.emit_event(EngineEvent::AddressMissing {
                    domain: domain.to_string(),
                });
            }
            Ok(ReconcileOutcome::UpdateFailed { errors, messages }) => {
                error!(
                    "Provider rejected update for {}: errors={:?} messages={:?}",
                    domain, errors, messages
                );
                self.emit_event(EngineEvent::UpdateRejected {
                    domain: domain.to_string(),
                    errors: errors.iter().map(ToString::to_string).collect(),
                    messages: messages.iter().map(ToString::to_string).collect(),
                });
            }
            Err(e) => {
                error!("Failed to process {}: {}", domain, e);
                self.emit_event(EngineEvent::DomainFailed {
                    domain: domain.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        // A dropped receiver means nobody is listening, which is fine
        if let Err(mpsc::error::TrySendError::Full(_)) = self.event_tx.try_send(event) {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}
