//! Contract Test: Configuration Gate
//!
//! An incomplete configuration must abort before any network activity:
//! engine construction fails and neither the IP source nor the provider
//! is ever called.

mod common;

use common::*;
use ddns_core::config::DdnsConfig;
use ddns_core::{DdnsEngine, Error};
use std::collections::HashMap;
use std::net::Ipv4Addr;

fn assert_rejected_without_calls(config: DdnsConfig) {
    let ip_source = ScriptedIpSource::new(Ipv4Addr::new(203, 0, 113, 5));
    let provider = MockDnsProvider::new().with_zone("example.com", "zid1");

    let result = DdnsEngine::new(
        Box::new(ScriptedIpSource::sharing_counters_with(&ip_source)),
        Box::new(MockDnsProvider::sharing_counters_with(&provider)),
        config,
    );

    assert!(matches!(result, Err(Error::Config(_))));
    assert_eq!(ip_source.call_count(), 0);
    assert_eq!(provider.total_calls(), 0);
}

#[test]
fn missing_domains_abort_without_calls() {
    assert_rejected_without_calls(DdnsConfig::new(Vec::new(), "a@b.com", "k"));
}

#[test]
fn missing_email_aborts_without_calls() {
    assert_rejected_without_calls(DdnsConfig::new(
        vec!["home.example.com".to_string()],
        "",
        "k",
    ));
}

#[test]
fn missing_api_key_aborts_without_calls() {
    assert_rejected_without_calls(DdnsConfig::new(
        vec!["home.example.com".to_string()],
        "a@b.com",
        " ",
    ));
}

#[test]
fn environment_loading_rejects_each_missing_variable() {
    let full = [
        ("DOMAIN_NAMES", "home.example.com"),
        ("ACCOUNT_EMAIL", "a@b.com"),
        ("API_KEY", "k"),
    ];

    for skipped in 0..full.len() {
        let vars: HashMap<&str, &str> = full
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skipped)
            .map(|(_, kv)| *kv)
            .collect();

        let result = DdnsConfig::from_vars(|key| vars.get(key).map(|v| v.to_string()));

        match result {
            Err(Error::Config(msg)) => assert!(msg.contains(full[skipped].0)),
            other => panic!("expected config error, got {other:?}"),
        }
    }
}
