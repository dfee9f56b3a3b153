//! Session logging for the installer.
//!
//! A synchronous sink for the `log` facade: every record is timestamped and
//! written both to stderr (the operator is watching a console) and to an
//! append-only session log file. The runner is single-threaded and blocking,
//! so there is no background persister; writes happen inline and the file is
//! flushed per line so the log survives a mid-step crash.

use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Default session log location, relative to the working directory of the
/// live environment.
pub fn default_log_path() -> PathBuf {
    PathBuf::from("ironstrap.log")
}

/// Logger writing to stderr and the session file.
pub struct InstallLog {
    file: Mutex<Option<File>>,
}

impl InstallLog {
    fn open(path: &Path) -> Result<Self, String> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| format!("failed to open session log {}: {}", path.display(), e))?;
        Ok(InstallLog {
            file: Mutex::new(Some(file)),
        })
    }
}

impl Log for InstallLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let timestamp = Local::now().format("%H:%M:%S%.3f");
        let line = format!("[{}] [{}] {}", timestamp, record.level(), record.args());

        eprintln!("{}", line);

        if let Ok(mut guard) = self.file.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = file.write_all(line.as_bytes());
                let _ = file.write_all(b"\n");
                let _ = file.flush();
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut guard) = self.file.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Install the session logger as the global `log` sink.
///
/// Must be called once, before anything logs. Returns an error if the log
/// file cannot be opened or a logger is already installed.
pub fn init(path: &Path) -> Result<(), String> {
    let logger = InstallLog::open(path)?;
    log::set_boxed_logger(Box::new(logger))
        .map(|()| log::set_max_level(LevelFilter::Debug))
        .map_err(|e| format!("failed to install logger: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_line_reaches_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.log");
        let logger = InstallLog::open(&path).unwrap();

        logger.log(
            &Record::builder()
                .args(format_args!("partitioning /dev/sda"))
                .level(Level::Info)
                .target("test")
                .build(),
        );
        logger.flush();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("partitioning /dev/sda"));
        assert!(content.contains("[INFO]"));
    }

    #[test]
    fn test_append_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.log");

        for msg in ["first", "second"] {
            let logger = InstallLog::open(&path).unwrap();
            logger.log(
                &Record::builder()
                    .args(format_args!("{}", msg))
                    .level(Level::Warn)
                    .target("test")
                    .build(),
            );
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("first"));
        assert!(content.contains("second"));
    }

    #[test]
    fn test_trace_is_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.log");
        let logger = InstallLog::open(&path).unwrap();
        assert!(!logger.enabled(&Metadata::builder().level(Level::Trace).build()));
        assert!(logger.enabled(&Metadata::builder().level(Level::Info).build()));
    }
}
