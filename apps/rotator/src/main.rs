//! Scheduled rotation runner.
//!
//! Loads configuration, processes every configured environment sequentially,
//! then mails the run summary with the registry document attached. Exits
//! non-zero only when an environment run fails fatally; individual account
//! failures are already counted and logged by the engine.

mod config;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use keywheel_notify::Notifier;
use keywheel_rotation::{RotationEngine, RotationReport};
use keywheel_sheet::{DocumentHandle, Locator, ObjectStore, S3ObjectStore};

use crate::config::AppConfig;

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = AppConfig::config_path();
    let mut config = AppConfig::from_file(&config_path).unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        std::process::exit(1);
    });
    config.apply_env_overrides();

    let locator = Locator::parse(&config.document_url).unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        std::process::exit(1);
    });

    let store = S3ObjectStore::from_env().await;
    let engine = RotationEngine::new(
        DocumentHandle::new(store.clone(), locator.clone()),
        config.roster.clone(),
        config.layout,
    );

    info!(document = %locator, environments = config.environments.len(), "starting rotation");

    let mut reports: Vec<RotationReport> = Vec::new();
    let mut fatal = false;
    for group in config.groups() {
        match engine.run(&group).await {
            Ok(report) => {
                info!(%report, "environment finished");
                reports.push(report);
            }
            Err(e) => {
                // Environments are independent; a fatal error in one does
                // not block the others, but the process exits non-zero.
                error!(environment = %group.name, error = %e, "environment run failed");
                fatal = true;
            }
        }
    }

    send_summary(&config, &store, &locator, &reports).await;

    if fatal {
        std::process::exit(1);
    }
}

/// Mail the run summary. Failures here are logged and swallowed: the
/// rotations themselves are already durable.
async fn send_summary(
    config: &AppConfig,
    store: &S3ObjectStore,
    locator: &Locator,
    reports: &[RotationReport],
) {
    let notifier = Notifier::new(config.mail.clone());
    if !notifier.is_enabled() || reports.is_empty() {
        return;
    }

    let attachment = match store.fetch(locator).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "could not fetch registry document for the summary email");
            return;
        }
    };
    let attachment_name = locator
        .key()
        .rsplit('/')
        .next()
        .unwrap_or("registry.json")
        .to_string();

    let body = reports
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");

    let outcome =
        tokio::task::spawn_blocking(move || notifier.send_summary(&body, &attachment_name, &attachment))
            .await;
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "summary notification failed"),
        Err(e) => warn!(error = %e, "summary notification task panicked"),
    }
}
