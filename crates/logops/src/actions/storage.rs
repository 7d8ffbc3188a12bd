//! `storage`: disk usage of the home, raw log and parsed log trees.
//!
//! The report only carries base names, never absolute paths, because it is
//! served to the dashboard as-is.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::info;

use super::capture;
use crate::settings::Settings;
use crate::sink::ErrorSink;

const UNKNOWN: &str = "?";

/// JSON object that keeps insertion order. Re-inserting a key replaces the
/// label but keeps the original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeMap(Vec<(String, String)>);

impl SizeMap {
    pub fn insert(&mut self, size: impl Into<String>, label: impl Into<String>) {
        let size = size.into();
        let label = label.into();
        match self.0.iter_mut().find(|(k, _)| *k == size) {
            Some((_, existing)) => *existing = label,
            None => self.0.push((size, label)),
        }
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.0
    }
}

impl Serialize for SizeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (size, label) in &self.0 {
            map.serialize_entry(size, label)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StorageReport {
    pub aymdhms: String,
    pub home_section: SizeMap,
    pub logs_parsed_tops: SizeMap,
}

/// Convert `du -h` sizes (`512`, `4.0K`, `1.1G`) to bytes for ordering.
pub fn parse_human_size(size: &str) -> Option<f64> {
    let size = size.trim();
    let split = size
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(size.len());
    let (number, unit) = size.split_at(split);
    let number: f64 = number.replace(',', ".").parse().ok()?;
    let power = match unit.to_ascii_uppercase().as_str() {
        "" | "B" => 0,
        "K" => 1,
        "M" => 2,
        "G" => 3,
        "T" => 4,
        "P" => 5,
        _ => return None,
    };
    Some(number * 1024f64.powi(power))
}

/// First column of `du` output.
pub fn first_size(du_output: &str) -> Option<String> {
    du_output
        .lines()
        .next()
        .and_then(|line| line.split('\t').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse `size\tname` lines, largest first.
pub fn parse_tops(du_output: &str) -> SizeMap {
    let mut rows: Vec<(String, String)> = du_output
        .lines()
        .filter_map(|line| {
            let (size, name) = line.split_once('\t')?;
            let name = Path::new(name.trim())
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| name.trim().to_string());
            Some((size.trim().to_string(), name))
        })
        .collect();
    rows.sort_by(|a, b| {
        let a = parse_human_size(&a.0).unwrap_or(0.0);
        let b = parse_human_size(&b.0).unwrap_or(0.0);
        b.total_cmp(&a)
    });

    let mut map = SizeMap::default();
    for (size, name) in rows {
        map.insert(size, name);
    }
    map
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn measure(settings: &Settings, dir: &Path, errors: &mut Vec<String>) -> String {
    let mut argv = settings.du_command.clone();
    argv.push(".".to_string());
    match capture(&argv, Some(dir)) {
        Ok(out) if out.success => first_size(&out.stdout).unwrap_or_else(|| {
            errors.push(format!("unexpected du output for {}: {:?}", dir.display(), out.stdout));
            UNKNOWN.to_string()
        }),
        Ok(out) => {
            errors.push(out.stderr);
            UNKNOWN.to_string()
        }
        Err(err) => {
            errors.push(format!("{}: {:?}", dir.display(), err));
            UNKNOWN.to_string()
        }
    }
}

fn measure_tops(settings: &Settings, errors: &mut Vec<String>) -> SizeMap {
    let dir = &settings.logs_parsed_dir;
    let mut names: Vec<String> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| !name.starts_with('.'))
            .collect(),
        Err(err) => {
            errors.push(format!("{}: {:?}", dir.display(), err));
            return SizeMap::default();
        }
    };
    if names.is_empty() {
        return SizeMap::default();
    }
    names.sort();

    let mut argv = settings.du_command.clone();
    argv.extend(names);
    match capture(&argv, Some(dir)) {
        Ok(out) if out.success => parse_tops(&out.stdout),
        Ok(out) => {
            errors.push(out.stderr);
            SizeMap::default()
        }
        Err(err) => {
            errors.push(format!("{:?}", err));
            SizeMap::default()
        }
    }
}

/// Measure everything; collected failures are returned alongside.
pub fn collect(settings: &Settings) -> (StorageReport, Vec<String>) {
    let mut errors = Vec::new();
    let home = dirs::home_dir().unwrap_or_else(|| Path::new(".").to_path_buf());

    let home_size = measure(settings, &home, &mut errors);
    let logs_size = measure(settings, &settings.logs_dir, &mut errors);
    let parsed_size = measure(settings, &settings.logs_parsed_dir, &mut errors);

    let mut home_section = SizeMap::default();
    home_section.insert(home_size, "~");
    home_section.insert(logs_size, base_name(&settings.logs_dir));
    home_section.insert(parsed_size, base_name(&settings.logs_parsed_dir));

    let report = StorageReport {
        aymdhms: Local::now().format("%a %Y-%m-%d %H:%M:%S").to_string(),
        home_section,
        logs_parsed_tops: measure_tops(settings, &mut errors),
    };
    (report, errors)
}

/// Overwrite `path` with the pretty-printed report plus a trailing newline.
/// The content goes to a sibling temp file first and is renamed into place.
pub fn write_report(report: &StorageReport, path: &Path) -> Result<()> {
    let mut body = serde_json::to_string_pretty(report)?;
    body.push('\n');

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

fn print_summary(report: &StorageReport) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new("Size"), Cell::new("Location")]);
    for (size, label) in report
        .home_section
        .entries()
        .iter()
        .chain(report.logs_parsed_tops.entries())
    {
        table.add_row(vec![Cell::new(size), Cell::new(label)]);
    }
    println!("{table}");
}

pub fn run(settings: &Settings, sink: &dyn ErrorSink) {
    let (report, errors) = collect(settings);
    for error in &errors {
        sink.record(error);
    }

    match write_report(&report, &settings.storage_file) {
        Ok(()) => {
            info!(path = %settings.storage_file.display(), "storage report written");
            print_summary(&report);
        }
        Err(err) => sink.record(&format!("{:#}", err)),
    }
}
