//! Domain name helpers
//!
//! Zones are keyed by registrable domain, so every configured name is reduced
//! to the label directly under its public suffix before zone lookup. Plain
//! "last two labels" stripping breaks on multi-label suffixes such as
//! `co.uk` or `com.au`; the public suffix list handles those.

use crate::error::{Error, Result};

/// Normalize a domain name for comparison: lower-case, no trailing dot
pub fn normalize(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Derive the registrable root domain of `domain`
///
/// ```
/// use ddns_core::domain::root_domain;
///
/// assert_eq!(root_domain("www.example.co.uk").unwrap(), "example.co.uk");
/// assert_eq!(root_domain("home.example.com").unwrap(), "example.com");
/// ```
pub fn root_domain(domain: &str) -> Result<String> {
    let name = normalize(domain);
    if name.is_empty() {
        return Err(Error::invalid_input("Domain name cannot be empty"));
    }

    psl::domain_str(&name)
        .map(str::to_string)
        .ok_or_else(|| {
            Error::invalid_input(format!(
                "Domain has no registrable part under a public suffix: {domain}"
            ))
        })
}

/// Validate that a string is a valid domain name
///
/// This implements basic DNS domain name validation per RFC 1035.
/// It's not comprehensive but catches common errors.
pub fn validate_domain_name(domain: &str) -> Result<()> {
    let domain = domain.trim_end_matches('.');

    if domain.is_empty() {
        return Err(Error::config("Domain name cannot be empty"));
    }

    // Total length limit (RFC 1035: 253 chars max)
    if domain.len() > 253 {
        return Err(Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(Error::config(format!(
            "Domain name must be fully qualified. Got: '{domain}'"
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(Error::config(format!(
                "Domain name has empty label: '{domain}'"
            )));
        }

        if label.len() > 63 {
            return Err(Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::config(format!(
                "Domain label contains invalid characters. Label: '{label}'. \
                Valid: alphanumeric and hyphen only."
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{label}'"
            )));
        }
    }

    Ok(())
}
