// # ddns-sync - one-shot A record synchronizer
//
// Thin integration layer: all DNS logic, retries and idempotency live in
// ddns-core. This binary only:
// 1. Seeds the environment from an optional `.env` file
// 2. Installs the tracing subscriber
// 3. Builds the configuration, IP source and provider
// 4. Runs one engine pass and maps the summary to an exit code
//
// ## Configuration
//
// ### Required
// - `DOMAIN_NAMES`: Comma-separated FQDNs whose A records are kept current
// - `ACCOUNT_EMAIL`: Cloudflare account e-mail (`X-Auth-Email`)
// - `API_KEY`: Cloudflare global API key (`X-Auth-Key`)
//
// ### Optional
// - `DDNS_IP_ORACLE_URL`: IP oracle (default `https://api.ipify.org?format=json`)
// - `DDNS_API_BASE`: Cloudflare API base (default `https://api.cloudflare.com/client/v4`)
// - `DDNS_HTTP_TIMEOUT_SECS`: Per-request timeout, 1-60 (default 6)
// - `DDNS_MAX_RETRIES`: Retries for transient failures, 0-10 (default 2)
// - `DDNS_RETRY_DELAY_MS`: Base backoff delay, 0-60000 (default 500)
// - `DDNS_MODE`: `live` or `dry-run` (default live)
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export DOMAIN_NAMES=home.example.com,vpn.example.co.uk
// export ACCOUNT_EMAIL=owner@example.com
// export API_KEY=your_global_api_key
//
// ddns-sync   # run from cron or a systemd timer
// ```

use anyhow::{Context, Result};
use ddns_core::{DdnsConfig, DdnsEngine, Error, RunSummary};
use ddns_ip_http::HttpIpSource;
use ddns_provider_cloudflare::CloudflareProvider;
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for the possible run results
///
/// - 0: Every domain processed without configuration or auth failure
/// - 1: Configuration error
/// - 2: Runtime error (IP oracle, runtime construction)
/// - 3: At least one domain was refused for bad credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
    AuthFailure = 3,
}

impl From<SyncExitCode> for ExitCode {
    fn from(code: SyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl SyncExitCode {
    /// Exit code for a completed run
    fn for_summary(summary: &RunSummary) -> Self {
        if summary.has_auth_failure() {
            SyncExitCode::AuthFailure
        } else {
            SyncExitCode::Success
        }
    }
}

/// Map `DDNS_LOG_LEVEL` to a tracing level, defaulting to info
fn parse_log_level(raw: Option<&str>) -> Level {
    match raw.map(|s| s.trim().to_lowercase()).as_deref() {
        Some("trace") => Level::TRACE,
        Some("debug") => Level::DEBUG,
        Some("warn") => Level::WARN,
        Some("error") => Level::ERROR,
        _ => Level::INFO,
    }
}

fn main() -> ExitCode {
    // A missing .env is normal; the process environment still applies
    let dotenv = dotenvy::dotenv();

    let log_level = parse_log_level(env::var("DDNS_LOG_LEVEL").ok().as_deref());
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SyncExitCode::RuntimeError.into();
    }

    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Ignoring unreadable .env file: {}", e),
    }

    let config = match DdnsConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration error: {}", e);
            return SyncExitCode::ConfigError.into();
        }
    };

    info!(
        "Starting ddns-sync for {} domain(s){}",
        config.domains.len(),
        if config.dry_run { " (dry run)" } else { "" }
    );

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(config).await {
            Ok(summary) => SyncExitCode::for_summary(&summary),
            Err(e) => {
                error!("Run aborted: {:#}", e);
                match e.downcast_ref::<Error>() {
                    Some(Error::Config(_)) => SyncExitCode::ConfigError,
                    _ => SyncExitCode::RuntimeError,
                }
            }
        }
    })
    .into()
}

/// Build the components and run one engine pass
async fn run(config: DdnsConfig) -> Result<RunSummary> {
    let ip_source = HttpIpSource::from_config(&config).context("Failed to build IP source")?;
    let provider = CloudflareProvider::from_config(&config).context("Failed to build provider")?;

    let (engine, events) = DdnsEngine::new(Box::new(ip_source), Box::new(provider), config)?;
    // Outcomes are logged by the engine; nothing reads events here
    drop(events);

    let summary = engine.run_once().await?;

    if summary.has_auth_failure() {
        warn!("Cloudflare rejected the credentials; check ACCOUNT_EMAIL and API_KEY");
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ddns_core::engine::DomainReport;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level(Some("debug")), Level::DEBUG);
        assert_eq!(parse_log_level(Some(" WARN ")), Level::WARN);
        assert_eq!(parse_log_level(Some("verbose")), Level::INFO);
        assert_eq!(parse_log_level(None), Level::INFO);
    }

    fn summary_with(result: ddns_core::Result<ddns_core::ReconcileOutcome>) -> RunSummary {
        RunSummary {
            ip: std::net::Ipv4Addr::new(203, 0, 113, 5),
            reports: vec![DomainReport {
                domain: "home.example.com".to_string(),
                result,
            }],
        }
    }

    #[test]
    fn test_auth_failure_maps_to_exit_code_3() {
        let summary = summary_with(Err(Error::auth("403 Forbidden")));

        assert_eq!(SyncExitCode::for_summary(&summary), SyncExitCode::AuthFailure);
    }

    #[test]
    fn test_unmanaged_zone_still_exits_cleanly() {
        let summary = summary_with(Err(Error::zone_not_managed(
            "example.org",
            vec!["example.com".to_string()],
        )));

        assert_eq!(SyncExitCode::for_summary(&summary), SyncExitCode::Success);
    }

    #[test]
    fn test_exit_code_values() {
        assert_eq!(SyncExitCode::Success as u8, 0);
        assert_eq!(SyncExitCode::ConfigError as u8, 1);
        assert_eq!(SyncExitCode::RuntimeError as u8, 2);
        assert_eq!(SyncExitCode::AuthFailure as u8, 3);
    }
}
