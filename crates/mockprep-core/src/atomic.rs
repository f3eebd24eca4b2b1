//! Atomic file replacement (internal).
//!
//! Content is written to a fresh temporary file next to the target, synced,
//! then renamed over the target. Readers see either the old file or the new
//! one, never a partial write. The temporary name carries the process id, a
//! nanosecond timestamp and a per-process counter, so concurrent writers do
//! not share a temporary file.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Atomically replace `path` with `content`, creating parent directories.
///
/// # Errors
///
/// Returns the underlying I/O error if any step fails. The temporary file is
/// removed on failure.
pub(crate) fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }

    let temp_path = temp_path_for(path)?;
    let result = write_and_sync(&temp_path, content).and_then(|()| fs::rename(&temp_path, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    debug!(path = %path.display(), bytes = content.len(), "replaced file");
    Ok(())
}

fn temp_path_for(target: &Path) -> io::Result<PathBuf> {
    let file_name = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid file path: {}", target.display()),
            )
        })?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let temp_name = format!(".{file_name}.{}.{nanos}.{seq}.tmp", std::process::id());

    Ok(target
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(temp_name))
}

fn write_and_sync(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_create_parent_dirs_and_write() {
        let dir = tempfile::TempDir::new().expect("should create temp dir");
        let path = dir.path().join("a").join("b").join("file.json");

        atomic_write(&path, b"[]").expect("should write");
        assert_eq!(fs::read(&path).expect("should read"), b"[]");
    }

    #[test]
    fn test_should_replace_existing_file_without_leftovers() {
        let dir = tempfile::TempDir::new().expect("should create temp dir");
        let path = dir.path().join("file.json");
        fs::write(&path, "old").expect("should write");

        atomic_write(&path, b"new").expect("should write");

        assert_eq!(fs::read_to_string(&path).expect("should read"), "new");
        let entries: Vec<_> = fs::read_dir(dir.path())
            .expect("should list")
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(entries.len(), 1, "temporary file should be renamed away");
    }

    #[test]
    fn test_should_use_distinct_temp_names() {
        let target = Path::new("/tmp/sessions.json");
        let a = temp_path_for(target).expect("should build");
        let b = temp_path_for(target).expect("should build");

        assert_ne!(a, b);
        let name = a.file_name().expect("name").to_string_lossy().into_owned();
        assert!(name.starts_with(".sessions.json."));
        assert!(name.contains(&std::process::id().to_string()));
        assert!(name.ends_with(".tmp"));
    }

    #[test]
    fn test_should_fail_when_parent_is_a_file() {
        let dir = tempfile::TempDir::new().expect("should create temp dir");
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").expect("should write");

        let result = atomic_write(&blocker.join("file.json"), b"[]");
        assert!(result.is_err());
    }
}
