//! Logging initialization and log file management.
//!
//! Provides dual-output tracing: stderr (human-readable) and an optional
//! JSON log file at `<logs-dir>/<slug>/<timestamp>.log`. File logging is
//! enabled for long-running commands (serve).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Maximum age of log files before cleanup, in days.
const LOG_RETENTION_DAYS: u64 = 3;

/// Initialize the tracing subscriber with stderr output.
///
/// When `slug` is `Some`, an additional JSON file layer is added
/// that writes to `<logs_dir>/<slug>/<timestamp>.log`.
///
/// Returns an optional [`WorkerGuard`] that must be held for the
/// lifetime of the program to ensure all buffered logs are flushed.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or the
/// log file cannot be opened.
pub fn init_tracing(logs_dir: &Path, slug: Option<&str>) -> Result<Option<WorkerGuard>> {
    if let Some((subscriber, guard)) = build_tracing(logs_dir, slug)? {
        subscriber.init();
        Ok(Some(guard))
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(EnvFilter::from_default_env())
            .init();
        Ok(None)
    }
}

/// Build the tracing subscriber layers without registering globally.
///
/// Returns `Some((subscriber, guard))` when a slug is provided (dual-layer),
/// or `None` when only stderr logging is needed.
fn build_tracing(
    logs_dir: &Path,
    slug: Option<&str>,
) -> Result<Option<(impl tracing::Subscriber + Send + Sync, WorkerGuard)>> {
    let Some(slug) = slug else {
        return Ok(None);
    };

    let (non_blocking, guard) = open_log_writer(logs_dir, slug)?;

    let subscriber = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::from_default_env()),
        );

    Ok(Some((subscriber, guard)))
}

/// Create the log directory and file, returning a non-blocking writer and guard.
fn open_log_writer(
    logs_dir: &Path,
    slug: &str,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let log_dir = logs_dir.join(slug);
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory: {}", log_dir.display()))?;

    let log_path = build_log_path(logs_dir, slug, Utc::now());
    let log_file = fs::File::create(&log_path)
        .with_context(|| format!("failed to create log file: {}", log_path.display()))?;

    Ok(tracing_appender::non_blocking(log_file))
}

/// Remove log files older than three days from `logs_dir`.
///
/// Best effort: failures on individual files are reported with `eprintln!`
/// since tracing is not initialized yet.
pub fn cleanup_old_logs(logs_dir: &Path) {
    if !logs_dir.is_dir() {
        return;
    }

    let cutoff = SystemTime::now() - Duration::from_secs(LOG_RETENTION_DAYS * 24 * 60 * 60);

    remove_old_log_files(logs_dir, cutoff);
    remove_empty_dirs(logs_dir);
}

/// Build the log file path: `<logs_dir>/<slug>/<YYYYMMDD_HHMMSS>.log`.
fn build_log_path(logs_dir: &Path, slug: &str, now: DateTime<Utc>) -> PathBuf {
    logs_dir
        .join(slug)
        .join(format!("{}.log", format_utc_timestamp(now)))
}

/// Format a UTC time as `YYYYMMDD_HHMMSS`.
fn format_utc_timestamp(time: DateTime<Utc>) -> String {
    time.format("%Y%m%d_%H%M%S").to_string()
}

/// Recursively remove `.log` files older than `cutoff` from `dir`.
fn remove_old_log_files(dir: &Path, cutoff: SystemTime) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!(
                "warning: failed to read log directory {}: {e}",
                dir.display()
            );
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();

        if path.is_dir() {
            remove_old_log_files(&path, cutoff);
            continue;
        }

        if path.extension().and_then(|e| e.to_str()) != Some("log") {
            continue;
        }

        let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) => {
                eprintln!(
                    "warning: failed to read metadata for {}: {e}",
                    path.display()
                );
                continue;
            }
        };

        if modified < cutoff
            && let Err(e) = fs::remove_file(&path)
        {
            eprintln!(
                "warning: failed to remove old log file {}: {e}",
                path.display(),
            );
        }
    }
}

/// Remove empty subdirectories under `dir` (does not remove `dir` itself).
fn remove_empty_dirs(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            remove_empty_dirs(&path);
            // Fails when not empty.
            let _ = fs::remove_dir(&path);
        }
    }
}
