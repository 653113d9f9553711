//! Diagnostic logging setup.
//!
//! The chat screen owns the terminal, so diagnostics only go to a file. With
//! no file configured nothing is installed and `tracing` macros are no-ops.

use std::error::Error;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_FILTER_ENV: &str = "THREADLINE_LOG";
const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber writing to `log_file`. Returns whether a
/// subscriber was installed.
pub fn init_tracing(log_file: Option<&str>) -> Result<bool, Box<dyn Error>> {
    let Some(path) = log_file.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(false);
    };
    let file = open_log_file(Path::new(path))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| -> Box<dyn Error> { err })?;
    Ok(true)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn open_log_file(path: &Path) -> Result<File, Box<dyn Error>> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| format!("Cannot open log file {}: {err}", path.display()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn no_log_file_installs_nothing() {
        assert!(!init_tracing(None).expect("no-op"));
        assert!(!init_tracing(Some("   ")).expect("no-op"));
    }

    #[test]
    fn log_file_receives_events_and_second_install_fails() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("threadline.log");
        let path_str = path.to_str().expect("utf-8 path");

        assert!(init_tracing(Some(path_str)).expect("install subscriber"));
        tracing::warn!("log sink check");
        let written = std::fs::read_to_string(&path).expect("read log");
        assert!(written.contains("log sink check"), "log was: {written:?}");

        let other = dir.path().join("other.log");
        let other = other.to_str().expect("utf-8 path");
        assert!(init_tracing(Some(other)).is_err());
    }

    #[test]
    fn log_file_is_created_with_parent_dirs() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("nested").join("threadline.log");
        open_log_file(&path).expect("open");
        assert!(path.exists());
    }

    #[test]
    fn unwritable_log_path_reports_the_path() {
        let dir = TempDir::new().expect("tempdir");
        let err = open_log_file(dir.path()).expect_err("directory is not a file");
        assert!(err.to_string().contains("Cannot open log file"));
    }
}
