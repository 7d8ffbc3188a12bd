//! Demo reset against a real directory tree with back-dated mtimes.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use filetime::{set_file_mtime, FileTime};
use logops::demo::{DemoLifecycleManager, DemoMode, REGENERATE_JOB};
use logops::runner::{JobError, JobInvoker, JobRunner};
use logops::sink::MemorySink;
use logops::switches::ParameterBundle;
use tempfile::TempDir;

const DAY: u64 = 86_400;

struct Regenerator {
    ok: bool,
}

impl JobInvoker for Regenerator {
    fn invoke(&self, job: &str, bundle: Option<&ParameterBundle>) -> Result<(), JobError> {
        assert_eq!(job, REGENERATE_JOB.name);
        assert!(bundle.is_none());
        if self.ok {
            Ok(())
        } else {
            Err(JobError::Other {
                job: job.to_string(),
                message: "generator crashed".to_string(),
            })
        }
    }
}

fn age(path: &Path, now: SystemTime, days: u64) {
    let when = now - Duration::from_secs(days * DAY);
    set_file_mtime(path, FileTime::from_system_time(when)).unwrap();
}

fn write(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "line\n").unwrap();
}

struct Tree {
    _dir: TempDir,
    logs: std::path::PathBuf,
    parsed: std::path::PathBuf,
}

fn tree() -> Tree {
    let dir = TempDir::new().unwrap();
    let logs = dir.path().join("logs");
    let parsed = dir.path().join("logs-parsed");
    fs::create_dir_all(&logs).unwrap();
    fs::create_dir_all(&parsed).unwrap();
    Tree {
        _dir: dir,
        logs,
        parsed,
    }
}

#[test]
fn test_prune_removes_only_stale_day_data() {
    let t = tree();
    let now = SystemTime::now();

    let old_log = t.logs.join("dns/2020-01-01.log");
    let fresh_log = t.logs.join("dns/today.log");
    let old_other = t.logs.join("dns/notes.txt");
    write(&old_log);
    write(&fresh_log);
    write(&old_other);
    age(&old_log, now, 30);
    age(&old_other, now, 30);

    let old_day = t.parsed.join("dns/2020-01-01");
    let fresh_day = t.parsed.join("dns/2099-01-01");
    write(&old_day.join("part.tsv"));
    write(&fresh_day.join("part.tsv"));
    age(&old_day, now, 30);

    // Non-day directories are never pruned, whatever their age.
    let reserved = t.parsed.join("country");
    write(&reserved.join("geo.tsv"));
    age(&reserved, now, 400);
    age(&t.parsed.join("dns"), now, 400);

    let manager = DemoLifecycleManager::new(&t.logs, &t.parsed, "country", 14);
    let sink = MemorySink::new();
    let report = manager.prune(now, &sink);

    assert!(!old_log.exists());
    assert!(fresh_log.exists());
    assert!(old_other.exists());
    assert!(!old_day.exists());
    assert!(fresh_day.exists());
    assert!(reserved.join("geo.tsv").exists());
    assert!(t.parsed.join("dns").exists());

    assert_eq!(report.removed.len(), 2);
    assert_eq!(report.failures, 0);
    assert!(sink.records().is_empty());
}

#[test]
fn test_prune_day_directory_at_parsed_root() {
    let t = tree();
    let now = SystemTime::now();

    let old_day = t.parsed.join("2020-01-01");
    write(&old_day.join("part.tsv"));
    age(&old_day, now, 30);

    let reserved = t.parsed.join("country");
    write(&reserved.join("geo.tsv"));
    age(&reserved, now, 30);

    let manager = DemoLifecycleManager::new(&t.logs, &t.parsed, "country", 14);
    let sink = MemorySink::new();
    let report = manager.prune(now, &sink);

    assert!(!old_day.exists());
    assert!(reserved.join("geo.tsv").exists());
    assert_eq!(report.removed, vec![old_day]);
    assert!(sink.records().is_empty());
}

#[test]
fn test_clean_keeps_reserved_directory_and_loose_files() {
    let t = tree();
    write(&t.logs.join("dns/today.log"));
    write(&t.parsed.join("dns/2024-06-04/part.tsv"));
    write(&t.parsed.join("country/geo.tsv"));
    write(&t.parsed.join("README"));

    let manager = DemoLifecycleManager::new(&t.logs, &t.parsed, "country", 14);
    let sink = MemorySink::new();
    let report = manager.clean(&sink);

    assert!(!t.logs.exists());
    assert!(!t.parsed.join("dns").exists());
    assert!(t.parsed.join("country/geo.tsv").exists());
    assert!(t.parsed.join("README").exists());
    assert_eq!(report.failures, 0);
}

#[test]
fn test_missing_directories_are_not_errors() {
    let dir = TempDir::new().unwrap();
    let manager = DemoLifecycleManager::new(
        dir.path().join("nope"),
        dir.path().join("nope-parsed"),
        "country",
        14,
    );
    let sink = MemorySink::new();

    assert_eq!(manager.clean(&sink).removed.len(), 0);
    assert_eq!(manager.prune(SystemTime::now(), &sink).removed.len(), 0);
    assert!(sink.records().is_empty());
}

#[test]
fn test_prepare_regenerates_after_reset() {
    let t = tree();
    write(&t.parsed.join("dns/2024-06-04/part.tsv"));

    let manager = DemoLifecycleManager::new(&t.logs, &t.parsed, "country", 14);
    let sink = MemorySink::new();

    let ok = Regenerator { ok: true };
    let report = manager.prepare(DemoMode::Clean, SystemTime::now(), &JobRunner::new(&ok), &sink);
    assert!(report.regenerated);
    assert_eq!(report.failures, 0);

    let broken = Regenerator { ok: false };
    let report = manager.prepare(
        DemoMode::Prune,
        SystemTime::now(),
        &JobRunner::new(&broken),
        &sink,
    );
    assert!(!report.regenerated);
    assert_eq!(report.failures, 1);
    assert!(sink.records()[0].contains("generator crashed"));
}
