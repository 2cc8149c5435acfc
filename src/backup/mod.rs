//! Backup engine — drains the photo source page by page and mirrors each
//! photo onto the storage as it arrives. One photo's failure is recorded
//! and never ends the run; only directory preparation and enumeration
//! errors are fatal.

pub mod error;
pub mod fetch;
pub mod names;

pub use error::PhotoError;
pub use fetch::{HttpImageFetcher, ImageFetcher};
pub use names::NameResolver;

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::disk::{DirectoryStatus, DiskError, DiskStore, UploadOutcome};
use crate::pacing::FixedIntervalGate;
use crate::retry::{retry_with_backoff, RetryAction, RetryConfig};
use crate::vk::{PhotoPager, PhotoPages, PhotoRecord, PAGE_INTERVAL};

/// Subset of application config consumed by the backup engine.
/// Decoupled from CLI parsing so the engine can be tested with fakes.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub owner_id: i64,
    pub directory: String,
    pub extension: String,
    pub dry_run: bool,
    pub no_progress_bar: bool,
    pub retry: RetryConfig,
}

/// One failed photo, with enough context to diagnose without re-running.
#[derive(Debug)]
pub struct PhotoFailure {
    /// 1-based position in enumeration order.
    pub position: u64,
    pub photo_id: i64,
    /// HTTP status behind the failure, when a server answered at all.
    pub status: Option<u16>,
    pub error: String,
}

/// Counters and failures accumulated over one run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub processed: u64,
    pub uploaded: u64,
    pub failures: Vec<PhotoFailure>,
}

/// Entry point for the backup engine.
///
/// Prepares the destination directory, then walks the album: each photo's
/// largest variant is fetched, given a collision-free name, and uploaded.
/// Cancellation is honored between photos. The report is returned whether
/// or not individual photos failed.
pub async fn run(
    source: &dyn PhotoPages,
    store: &dyn DiskStore,
    fetcher: &dyn ImageFetcher,
    config: &BackupConfig,
    cancel: CancellationToken,
) -> Result<RunReport> {
    let started = Instant::now();
    let directory_path = format!("/{}", config.directory);

    if config.dry_run {
        info!("[DRY RUN] Would ensure directory {directory_path}");
    } else {
        let status = store
            .ensure_directory(&directory_path)
            .await
            .context("preparing destination directory")?;
        match status {
            DirectoryStatus::Created => info!("Created directory {directory_path}"),
            DirectoryStatus::AlreadyExists => {
                info!("Directory {directory_path} already exists")
            }
        }
    }

    let resolver = NameResolver::new();
    let mut pager = PhotoPager::new(
        source,
        config.owner_id,
        FixedIntervalGate::new(PAGE_INTERVAL),
        cancel.clone(),
    );

    let progress = create_progress_bar(config.no_progress_bar);
    let mut report = RunReport::default();

    'pages: while let Some(page) = pager.next_page().await.context("enumerating photos")? {
        if let Some(total) = pager.total() {
            progress.set_length(total);
        }
        for record in page.items {
            if cancel.is_cancelled() {
                progress.suspend(|| info!("Shutdown requested, stopping before the next photo"));
                break 'pages;
            }
            report.processed += 1;
            let position = report.processed;
            match back_up_photo(store, fetcher, &resolver, config, &record).await {
                Ok(path) => {
                    report.uploaded += 1;
                    progress.set_message(file_name(&path));
                }
                Err(e) => {
                    let failure = PhotoFailure {
                        position,
                        photo_id: record.id,
                        status: e.status_code(),
                        error: e.to_string(),
                    };
                    // indicatif needs `suspend` so log lines and bar redraws
                    // do not interleave.
                    progress.suspend(|| {
                        error!("Photo {} (#{}) failed: {}", record.id, position, failure.error);
                    });
                    report.failures.push(failure);
                }
            }
            progress.inc(1);
        }
    }
    progress.finish_and_clear();

    log_summary(&report, config, started.elapsed());
    Ok(report)
}

/// Mirror a single photo: pick the largest variant, resolve a free name,
/// download, then negotiate an href and upload. The two network legs get
/// independent retry budgets; a retried upload negotiates a fresh href
/// because hrefs are single-use.
async fn back_up_photo(
    store: &dyn DiskStore,
    fetcher: &dyn ImageFetcher,
    resolver: &NameResolver,
    config: &BackupConfig,
    record: &PhotoRecord,
) -> std::result::Result<String, PhotoError> {
    let variant = record.largest().ok_or(PhotoError::NoVariants)?;
    let base = record.likes.count.to_string();
    let path = resolver
        .resolve(store, &config.directory, &base, &config.extension)
        .await?;
    debug!(
        "Photo {}: variant {} ({}x{}) -> {}",
        record.id, variant.letter, variant.width, variant.height, path
    );

    if config.dry_run {
        info!("[DRY RUN] Would upload {path}");
        return Ok(path);
    }

    let classify = |e: &PhotoError| {
        if e.is_retryable() {
            RetryAction::Retry
        } else {
            RetryAction::Abort
        }
    };

    let bytes =
        retry_with_backoff(&config.retry, classify, || fetcher.fetch(&variant.url)).await?;

    retry_with_backoff(&config.retry, classify, || async {
        let href = store.request_upload_href(&path, true).await?;
        match store.upload(&href, bytes.clone()).await? {
            UploadOutcome::Accepted => Ok(()),
            UploadOutcome::Refused(status) => Err(PhotoError::Storage(DiskError::Rejected {
                status,
                path: path.clone(),
            })),
        }
    })
    .await?;

    Ok(path)
}

/// Hidden when requested or when stdout is not a TTY (piped output, cron).
/// The length arrives with the first page's collection total.
fn create_progress_bar(no_progress_bar: bool) -> ProgressBar {
    if no_progress_bar || !std::io::stdout().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .expect("valid template")
        .progress_chars("=> "),
    );
    pb
}

fn file_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

fn log_summary(report: &RunReport, config: &BackupConfig, elapsed: Duration) {
    if config.dry_run {
        info!("── Dry Run Summary ──");
        info!(
            "  {} photos would be uploaded to /{}",
            report.uploaded, config.directory
        );
        info!("  elapsed: {}", format_duration(elapsed));
        return;
    }

    info!("── Summary ──");
    info!(
        "  {} uploaded, {} failed, {} processed",
        report.uploaded,
        report.failures.len(),
        report.processed
    );
    info!("  elapsed: {}", format_duration(elapsed));
    for failure in &report.failures {
        error!(
            "Photo {} (#{}) not uploaded: {}",
            failure.photo_id, failure.position, failure.error
        );
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    match (secs / 3600, (secs % 3600) / 60, secs % 60) {
        (0, 0, s) => format!("{s}s"),
        (0, m, s) => format!("{m}m {s:02}s"),
        (h, m, s) => format!("{h}h {m:02}m {s:02}s"),
    }
}
