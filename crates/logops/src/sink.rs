//! Per-invocation error sink.
//!
//! Every row-level failure ends up here as one appended record. Recording
//! never fails from the caller's point of view: if the error file cannot be
//! written, the record still reaches the tracing output.

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::error;

/// Append-only destination for failure messages.
pub trait ErrorSink {
    fn record(&self, message: &str);
}

/// Sink backed by `<project_dir>/<command>-error-<action>`.
#[derive(Debug, Clone)]
pub struct FileErrorSink {
    command: String,
    host: String,
    error_file: PathBuf,
}

impl FileErrorSink {
    pub fn new(command: impl Into<String>, host: impl Into<String>, error_file: PathBuf) -> Self {
        Self {
            command: command.into(),
            host: host.into(),
            error_file,
        }
    }

    /// Standard error file location for an action.
    pub fn error_file_for(project_dir: &Path, command: &str, action: &str) -> PathBuf {
        project_dir.join(format!("{}-error-{}", command, action))
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.error_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.error_file)?;
        writeln!(file, "{}", line)
    }
}

impl ErrorSink for FileErrorSink {
    fn record(&self, message: &str) {
        error!(command = %self.command, host = %self.host, "{}", message);

        let line = format!(
            "{} {} {}: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            self.host,
            self.command,
            message.replace('\n', " | ")
        );
        if let Err(err) = self.append(&line) {
            error!(
                path = %self.error_file.display(),
                "failed to append to error file: {}",
                err
            );
        }
    }
}

/// In-memory sink, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<String> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl ErrorSink for MemorySink {
    fn record(&self, message: &str) {
        if let Ok(mut records) = self.records.lock() {
            records.push(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_error_file_name() {
        let path = FileErrorSink::error_file_for(Path::new("/srv/app"), "actions", "parse");
        assert_eq!(path, PathBuf::from("/srv/app/actions-error-parse"));
    }

    #[test]
    fn test_file_sink_appends_one_line_per_record() {
        let dir = TempDir::new().unwrap();
        let path = FileErrorSink::error_file_for(dir.path(), "actions", "parse");
        let sink = FileErrorSink::new("actions", "analyzer-01", path.clone());

        sink.record("parse-dns: exit status 1");
        sink.record("multi\nline");

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("analyzer-01 actions: parse-dns: exit status 1"));
        assert!(lines[1].ends_with("multi | line"));
    }

    #[test]
    fn test_file_sink_never_panics_on_unwritable_path() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();

        let sink = FileErrorSink::new("actions", "host", blocker.join("actions-error-parse"));
        sink.record("still fine");
    }

    #[test]
    fn test_memory_sink_collects() {
        let sink = MemorySink::new();
        sink.record("a");
        sink.record("b");
        assert_eq!(sink.records(), vec!["a", "b"]);
    }
}
