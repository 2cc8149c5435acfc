//! vkpb-rs — back up a VK user's profile photos to Yandex Disk.
//!
//! Walks the profile album page by page, names every photo after its like
//! count (suffixed on collision), and uploads the largest size variant.
//! Individual photo failures are logged and summarized; only directory
//! preparation and enumeration errors end the run early.

#![warn(clippy::all)]

mod backup;
mod cli;
mod config;
mod disk;
mod pacing;
pub mod retry;
mod shutdown;
mod types;
mod vk;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Generous whole-request ceiling; a single photo upload can be slow.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_filter())),
        )
        .init();

    let config = config::Config::resolve(cli)?;
    tracing::debug!(?config, "Resolved configuration");

    let http = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    let source = vk::VkClient::new(http.clone(), config.vk_token.clone());
    let store = disk::DiskClient::over_http(http.clone(), &config.disk_token);
    let fetcher = backup::HttpImageFetcher::new(http);

    let backup_config = backup::BackupConfig {
        owner_id: config.owner_id,
        directory: config.directory.clone(),
        extension: config.extension.clone(),
        dry_run: config.dry_run,
        no_progress_bar: config.no_progress_bar,
        retry: config.retry.clone(),
    };

    let shutdown_token = shutdown::install_signal_handler();

    let report = backup::run(&source, &store, &fetcher, &backup_config, shutdown_token).await?;

    // Partial failure is reported, not fatal: a completed run exits 0 so
    // repeated invocations from cron stay quiet.
    if !report.failures.is_empty() {
        tracing::warn!(
            "{} of {} photos were not uploaded; rerun to retry them",
            report.failures.len(),
            report.processed
        );
    }
    Ok(())
}
