//! Static batch tables.
//!
//! Row order is execution order. Later rows may consume files that earlier
//! rows fetched or moved, so reordering a table is a correctness bug. Known
//! data dependencies are also written down in `must_run_after` and checked by
//! [`PipelineTable::validate`]; anyone editing a table must keep both in sync.

use super::PipelineError;

/// One job in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineRow {
    pub name: &'static str,
    pub needs_parameters: bool,
    pub must_run_after: &'static [&'static str],
}

impl PipelineRow {
    pub const fn new(name: &'static str, needs_parameters: bool) -> Self {
        Self {
            name,
            needs_parameters,
            must_run_after: &[],
        }
    }

    pub const fn after(self, deps: &'static [&'static str]) -> Self {
        Self {
            must_run_after: deps,
            ..self
        }
    }
}

const BATCH_ONE: &[PipelineRow] = &[
    PipelineRow::new("parse-switch", true),
    PipelineRow::new("parse-windowsserver", true),
    PipelineRow::new("parse-daemon", true),
    PipelineRow::new("parse-filterlog", true),
    PipelineRow::new("parse-router", true),
    PipelineRow::new("parse-routerboard", true),
    PipelineRow::new("parse-squid", true),
    PipelineRow::new("parse-useraudit", true),
    PipelineRow::new("parse-userwarning", true),
    PipelineRow::new("parse-vmware", true),
];

const BATCH_TWO: &[PipelineRow] = &[
    PipelineRow::new("fetch-malicious", false),
    PipelineRow::new("parse-snort", true).after(&["fetch-malicious"]),
    PipelineRow::new("update-snort", false).after(&["parse-snort"]),
    // update-dhcp is disabled; parse-dhcp still has to follow snort.
    PipelineRow::new("parse-dhcp", true).after(&["parse-snort", "update-snort"]),
    PipelineRow::new("parse-dns", true).after(&["parse-snort", "fetch-malicious"]),
    PipelineRow::new("update-dns", false).after(&["parse-dns"]),
    PipelineRow::new("parse-general", true),
];

/// Mapping from batch id to its ordered rows. Insertion order is kept.
#[derive(Debug, Clone, Default)]
pub struct PipelineTable {
    batches: Vec<(String, Vec<PipelineRow>)>,
}

impl PipelineTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The production tables for batches `one` and `two`.
    pub fn builtin() -> Self {
        Self::new()
            .with_batch("one", BATCH_ONE.to_vec())
            .with_batch("two", BATCH_TWO.to_vec())
    }

    pub fn with_batch(mut self, id: impl Into<String>, rows: Vec<PipelineRow>) -> Self {
        let id = id.into();
        match self.batches.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, existing_rows)) => *existing_rows = rows,
            None => self.batches.push((id, rows)),
        }
        self
    }

    pub fn batch_ids(&self) -> Vec<&str> {
        self.batches.iter().map(|(id, _)| id.as_str()).collect()
    }

    pub fn rows_for(&self, batch: &str) -> Result<&[PipelineRow], PipelineError> {
        self.batches
            .iter()
            .find(|(id, _)| id == batch)
            .map(|(_, rows)| rows.as_slice())
            .ok_or_else(|| PipelineError::InvalidBatch {
                batch: batch.to_string(),
                known: self.batch_ids().iter().map(|s| s.to_string()).collect(),
            })
    }

    /// Check that every declared dependency present in a batch runs earlier.
    /// Dependencies on jobs that are not part of the batch are ignored.
    pub fn validate(&self) -> Result<(), PipelineError> {
        for (batch, rows) in &self.batches {
            for (idx, row) in rows.iter().enumerate() {
                for dep in row.must_run_after {
                    let Some(dep_idx) = rows.iter().position(|r| r.name == *dep) else {
                        continue;
                    };
                    if dep_idx >= idx {
                        return Err(PipelineError::OrderingViolation {
                            batch: batch.clone(),
                            job: row.name.to_string(),
                            dependency: dep.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
