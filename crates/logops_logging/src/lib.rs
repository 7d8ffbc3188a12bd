//! Tracing setup shared by the logops binaries.
//!
//! Two sinks are installed: a daily-rolled plain-text file under
//! `<home>/logs/<app>.<date>.log` and a human-readable stderr layer.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const DEFAULT_LOG_FILTER: &str = "logops=info,logops_logging=info";
const DEFAULT_MAX_LOG_FILES: usize = 5;

/// Logging configuration for one process.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    /// Console gets `debug` regardless of `RUST_LOG`.
    pub verbose: bool,
    /// Defaults to [`logs_dir`] when `None`.
    pub log_dir: Option<PathBuf>,
    /// Rolled files kept on disk, oldest deleted first.
    pub max_files: usize,
}

impl<'a> LogConfig<'a> {
    pub fn new(app_name: &'a str) -> Self {
        Self {
            app_name,
            verbose: false,
            log_dir: None,
            max_files: DEFAULT_MAX_LOG_FILES,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }
}

/// Install the global tracing subscriber.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let log_dir = match config.log_dir {
        Some(dir) => dir,
        None => logs_dir(),
    };
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create logs directory: {}", log_dir.display()))?;

    let file_writer = file_appender(&log_dir, config.app_name, config.max_files)?;

    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let console_filter = if config.verbose {
        EnvFilter::new("logops=debug,logops_logging=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(())
}

/// Logops home directory.
///
/// Priority:
/// 1) LOGOPS_HOME
/// 2) ~/.logops
/// 3) ./.logops
pub fn logops_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("LOGOPS_HOME") {
        return PathBuf::from(override_path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".logops")
}

/// Default process log directory: `<home>/logs`
pub fn logs_dir() -> PathBuf {
    logops_home().join("logs")
}

fn file_appender(dir: &Path, app_name: &str, max_files: usize) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(sanitize_name(app_name))
        .filename_suffix("log")
        .max_log_files(max_files.max(1))
        .build(dir)
        .with_context(|| format!("Failed to open log file for {} in {}", app_name, dir.display()))
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("logops"), "logops");
        assert_eq!(sanitize_name("log ops/1"), "log_ops_1");
    }

    #[test]
    fn test_file_appender_writes_dated_file() {
        let dir = TempDir::new().unwrap();
        let mut appender = file_appender(dir.path(), "log ops", 3).unwrap();
        appender.write_all(b"first line\n").unwrap();
        appender.flush().unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("log_ops."));
        assert!(names[0].ends_with(".log"));

        let content = fs::read_to_string(dir.path().join(&names[0])).unwrap();
        assert_eq!(content, "first line\n");
    }

    #[test]
    fn test_config_builder() {
        let config = LogConfig::new("logops").verbose(true).log_dir("/tmp/x");
        assert!(config.verbose);
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/x")));
        assert_eq!(config.max_files, DEFAULT_MAX_LOG_FILES);
    }
}
