//! Test doubles and common utilities for engine contract tests
//!
//! The doubles count every call so tests can assert on what reached the
//! "network", and can be scripted to fail in specific ways.

#![allow(dead_code)]

use ddns_core::error::{Error, Result};
use ddns_core::traits::{
    DnsProvider, DnsRecord, IpSource, RecordType, RecordUpdate, UpdateResponse, Zone,
};
use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted answer for a mocked call
#[derive(Debug, Clone)]
pub enum Scripted<T> {
    /// Answer normally
    Ok(T),
    /// Credentials rejected
    Auth,
    /// Timeout / 5xx
    Transient,
    /// Permanent HTTP failure
    Fail,
}

impl<T> Scripted<T> {
    fn into_result(self) -> Result<T> {
        match self {
            Scripted::Ok(value) => Ok(value),
            Scripted::Auth => Err(Error::auth("403 Forbidden")),
            Scripted::Transient => Err(Error::transient("request timed out")),
            Scripted::Fail => Err(Error::http("400 Bad Request")),
        }
    }
}

/// An IP source that answers from a script, then with a fixed address
pub struct ScriptedIpSource {
    ip: Ipv4Addr,
    script: Arc<Mutex<VecDeque<Scripted<Ipv4Addr>>>>,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    pub fn new(ip: Ipv4Addr) -> Self {
        Self {
            ip,
            script: Arc::new(Mutex::new(VecDeque::new())),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue an answer to be returned before the fixed address
    pub fn then(self, answer: Scripted<Ipv4Addr>) -> Self {
        self.script.lock().unwrap().push_back(answer);
        self
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Create a new source that shares script and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            ip: other.ip,
            script: Arc::clone(&other.script),
            call_count: Arc::clone(&other.call_count),
        }
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(answer) => answer.into_result(),
            None => Ok(self.ip),
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A recorded update call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCall {
    pub zone_id: String,
    pub record_id: String,
    pub body: RecordUpdate,
}

/// An in-memory DnsProvider that tracks calls
///
/// Successful updates are applied to the stored records, so a second run
/// observes the new content.
pub struct MockDnsProvider {
    zones: Arc<Mutex<Vec<Zone>>>,
    records: Arc<Mutex<HashMap<String, Vec<DnsRecord>>>>,
    zone_script: Arc<Mutex<VecDeque<Scripted<()>>>>,
    record_script: Arc<Mutex<VecDeque<Scripted<()>>>>,
    update_script: Arc<Mutex<VecDeque<Scripted<UpdateResponse>>>>,
    list_zones_calls: Arc<AtomicUsize>,
    list_records_calls: Arc<Mutex<Vec<(String, String)>>>,
    update_calls: Arc<Mutex<Vec<UpdateCall>>>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self {
            zones: Arc::new(Mutex::new(Vec::new())),
            records: Arc::new(Mutex::new(HashMap::new())),
            zone_script: Arc::new(Mutex::new(VecDeque::new())),
            record_script: Arc::new(Mutex::new(VecDeque::new())),
            update_script: Arc::new(Mutex::new(VecDeque::new())),
            list_zones_calls: Arc::new(AtomicUsize::new(0)),
            list_records_calls: Arc::new(Mutex::new(Vec::new())),
            update_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a zone owned by the account
    pub fn with_zone(self, name: &str, id: &str) -> Self {
        self.zones.lock().unwrap().push(Zone {
            name: name.to_string(),
            id: id.to_string(),
        });
        self
    }

    /// Add a record; records are returned in insertion order
    pub fn with_record(self, record: DnsRecord) -> Self {
        self.records
            .lock()
            .unwrap()
            .entry(record.name.clone())
            .or_default()
            .push(record);
        self
    }

    /// Queue an answer for the next zone listing
    pub fn script_zones(self, answer: Scripted<()>) -> Self {
        self.zone_script.lock().unwrap().push_back(answer);
        self
    }

    /// Queue an answer for the next record listing
    pub fn script_records(self, answer: Scripted<()>) -> Self {
        self.record_script.lock().unwrap().push_back(answer);
        self
    }

    /// Queue an answer for the next update
    pub fn script_update(self, answer: Scripted<UpdateResponse>) -> Self {
        self.update_script.lock().unwrap().push_back(answer);
        self
    }

    /// Get the number of times list_zones() was called
    pub fn list_zones_count(&self) -> usize {
        self.list_zones_calls.load(Ordering::SeqCst)
    }

    /// Get the (zone_id, name) pairs passed to list_records()
    pub fn list_records_calls(&self) -> Vec<(String, String)> {
        self.list_records_calls.lock().unwrap().clone()
    }

    /// Get every update call
    pub fn update_calls(&self) -> Vec<UpdateCall> {
        self.update_calls.lock().unwrap().clone()
    }

    /// Total calls that reached the provider
    pub fn total_calls(&self) -> usize {
        self.list_zones_count() + self.list_records_calls().len() + self.update_calls().len()
    }

    /// Current content of the first record with this id
    pub fn content_of(&self, record_id: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .values()
            .flatten()
            .find(|r| r.id == record_id)
            .map(|r| r.content.clone())
    }

    /// Create a new MockDnsProvider that shares state and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            zones: Arc::clone(&other.zones),
            records: Arc::clone(&other.records),
            zone_script: Arc::clone(&other.zone_script),
            record_script: Arc::clone(&other.record_script),
            update_script: Arc::clone(&other.update_script),
            list_zones_calls: Arc::clone(&other.list_zones_calls),
            list_records_calls: Arc::clone(&other.list_records_calls),
            update_calls: Arc::clone(&other.update_calls),
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        self.list_zones_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(answer) = self.zone_script.lock().unwrap().pop_front() {
            answer.into_result()?;
        }
        Ok(self.zones.lock().unwrap().clone())
    }

    async fn list_records(&self, zone_id: &str, name: &str) -> Result<Vec<DnsRecord>> {
        self.list_records_calls
            .lock()
            .unwrap()
            .push((zone_id.to_string(), name.to_string()));
        if let Some(answer) = self.record_script.lock().unwrap().pop_front() {
            answer.into_result()?;
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<UpdateResponse> {
        self.update_calls.lock().unwrap().push(UpdateCall {
            zone_id: zone_id.to_string(),
            record_id: record_id.to_string(),
            body: update.clone(),
        });

        let response = match self.update_script.lock().unwrap().pop_front() {
            Some(answer) => answer.into_result()?,
            None => UpdateResponse {
                success: true,
                ..UpdateResponse::default()
            },
        };

        if response.success {
            let mut records = self.records.lock().unwrap();
            if let Some(record) = records.values_mut().flatten().find(|r| r.id == record_id) {
                record.content = update.content.clone();
            }
        }

        Ok(response)
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Build a DNS record
pub fn record(id: &str, record_type: RecordType, name: &str, content: &str) -> DnsRecord {
    DnsRecord {
        id: id.to_string(),
        record_type,
        name: name.to_string(),
        content: content.to_string(),
    }
}

/// Helper to create a minimal DdnsConfig for testing
pub fn minimal_config(domains: &[&str]) -> ddns_core::config::DdnsConfig {
    let mut config = ddns_core::config::DdnsConfig::new(
        domains.iter().map(|d| d.to_string()).collect(),
        "a@b.com",
        "k",
    );
    config.engine = ddns_core::config::EngineConfig {
        max_retries: 2,
        retry_delay_ms: 0, // No backoff wait in tests
        request_timeout_secs: 6,
        event_channel_capacity: 100,
    };
    config
}

/// Drain every event currently buffered in the receiver
pub fn drain_events(
    rx: &mut tokio::sync::mpsc::Receiver<ddns_core::EngineEvent>,
) -> Vec<ddns_core::EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
