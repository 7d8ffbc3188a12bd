//! Demo data lifecycle.
//!
//! On a demo host, batch `one` starts by resetting or ageing out synthetic
//! logs and then regenerating them. Every filesystem failure here is recorded
//! and skipped; none of it stops the batch that follows.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::{Duration, SystemTime};

use regex::Regex;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::pipeline::PipelineRow;
use crate::runner::{JobOutcome, JobRunner};
use crate::sink::ErrorSink;
use crate::switches::ParameterBundle;

pub const SECONDS_PER_DAY: u64 = 86_400;

/// Job that writes fresh synthetic logs.
pub const REGENERATE_JOB: PipelineRow = PipelineRow::new("create-fake-logs", false);

static YMD_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static YMD_ANYWHERE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap());

/// `2024-06-04`
pub fn is_ymd(name: &str) -> bool {
    YMD_NAME.is_match(name)
}

/// `/srv/logs-parsed/dhcp/2024-06-04` yes, `/srv/logs-parsed/dns` no.
pub fn contains_ymd(path: &Path) -> bool {
    YMD_ANYWHERE.is_match(&path.to_string_lossy())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoMode {
    /// Remove everything, keep only the reserved parsed directory.
    Clean,
    /// Remove only data older than the retention window.
    Prune,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemoReport {
    pub removed: Vec<PathBuf>,
    pub failures: usize,
    pub regenerated: bool,
}

pub struct DemoLifecycleManager {
    logs_dir: PathBuf,
    logs_parsed_dir: PathBuf,
    reserved_dir: String,
    max_days: u64,
}

impl DemoLifecycleManager {
    pub fn new(
        logs_dir: impl Into<PathBuf>,
        logs_parsed_dir: impl Into<PathBuf>,
        reserved_dir: impl Into<String>,
        max_days: u64,
    ) -> Self {
        Self {
            logs_dir: logs_dir.into(),
            logs_parsed_dir: logs_parsed_dir.into(),
            reserved_dir: reserved_dir.into(),
            max_days,
        }
    }

    /// Anything last modified before this instant is stale.
    pub fn cutoff(&self, now: SystemTime) -> SystemTime {
        let window = Duration::from_secs(self.max_days.saturating_mul(SECONDS_PER_DAY));
        now.checked_sub(window).unwrap_or(SystemTime::UNIX_EPOCH)
    }

    /// Clean or prune, then regenerate synthetic logs.
    pub fn prepare(
        &self,
        mode: DemoMode,
        now: SystemTime,
        runner: &JobRunner<'_>,
        sink: &dyn ErrorSink,
    ) -> DemoReport {
        let mut report = match mode {
            DemoMode::Clean => self.clean(sink),
            DemoMode::Prune => self.prune(now, sink),
        };

        let outcome = runner.run(&REGENERATE_JOB, &ParameterBundle::default(), sink);
        report.regenerated = outcome.is_success();
        if let JobOutcome::Failure { .. } = outcome {
            report.failures += 1;
        }
        report
    }

    pub fn clean(&self, sink: &dyn ErrorSink) -> DemoReport {
        let mut report = DemoReport::default();

        if self.logs_dir.exists() {
            info!("removing {}", self.logs_dir.display());
            remove_tree(&self.logs_dir, &mut report, sink);
        }

        if self.logs_parsed_dir.exists() {
            info!(
                "removing directories inside {} (except {})",
                self.logs_parsed_dir.display(),
                self.reserved_dir
            );
            match fs::read_dir(&self.logs_parsed_dir) {
                Ok(entries) => {
                    for entry in entries {
                        let entry = match entry {
                            Ok(entry) => entry,
                            Err(err) => {
                                fail(&mut report, sink, format!("{:?}", err));
                                continue;
                            }
                        };
                        if entry.file_name().to_string_lossy() == self.reserved_dir {
                            continue;
                        }
                        let path = entry.path();
                        if path.is_dir() {
                            remove_tree(&path, &mut report, sink);
                        }
                    }
                }
                Err(err) => fail(
                    &mut report,
                    sink,
                    format!("reading {}: {:?}", self.logs_parsed_dir.display(), err),
                ),
            }
        }

        report
    }

    pub fn prune(&self, now: SystemTime, sink: &dyn ErrorSink) -> DemoReport {
        let mut report = DemoReport::default();
        let cutoff = self.cutoff(now);

        if self.logs_dir.exists() {
            info!("removing logs older than {} days", self.max_days);
            for entry in WalkDir::new(&self.logs_dir).min_depth(1) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        fail(&mut report, sink, format!("{:?}", err));
                        continue;
                    }
                };
                let path = entry.path();
                let is_log = entry.file_type().is_file()
                    && path.extension().map(|ext| ext == "log").unwrap_or(false);
                if !is_log || !older_than(path, cutoff) {
                    continue;
                }
                info!("  removing {}", path.display());
                match fs::remove_file(path) {
                    Ok(()) => report.removed.push(path.to_path_buf()),
                    Err(err) => fail(&mut report, sink, format!("{}: {:?}", path.display(), err)),
                }
            }
        }

        if self.logs_parsed_dir.exists() {
            info!(
                "removing directories inside {} older than {} days",
                self.logs_parsed_dir.display(),
                self.max_days
            );
            // Children before parents, so a stale day directory nested in
            // another one is handled before its parent goes.
            for entry in WalkDir::new(&self.logs_parsed_dir)
                .min_depth(1)
                .contents_first(true)
            {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        fail(&mut report, sink, format!("{:?}", err));
                        continue;
                    }
                };
                let path = entry.path();
                if !entry.file_type().is_dir() || !is_ymd(&entry.file_name().to_string_lossy()) {
                    continue;
                }
                // Never touch a source directory such as .../dns.
                if !contains_ymd(path) || !path.exists() {
                    continue;
                }
                if older_than(path, cutoff) {
                    info!("  removing {}", path.display());
                    remove_tree(path, &mut report, sink);
                }
            }
        }

        report
    }
}

fn older_than(path: &Path, cutoff: SystemTime) -> bool {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map(|modified| modified < cutoff)
        .unwrap_or(false)
}

fn remove_tree(path: &Path, report: &mut DemoReport, sink: &dyn ErrorSink) {
    match fs::remove_dir_all(path) {
        Ok(()) => report.removed.push(path.to_path_buf()),
        Err(err) => fail(report, sink, format!("{}: {:?}", path.display(), err)),
    }
}

fn fail(report: &mut DemoReport, sink: &dyn ErrorSink, message: String) {
    warn!("{}", message);
    report.failures += 1;
    sink.record(&message);
}
