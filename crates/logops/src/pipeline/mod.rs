//! Batch execution engine for the parse-family actions.
//!
//! Rows run strictly one after another, in table order. A failing row is
//! recorded and the walk moves on; only an interrupt stops it early, and
//! then only between rows.

mod table;

pub use table::{PipelineRow, PipelineTable};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::filter::JobFilter;
use crate::runner::{JobOutcome, JobRunner};
use crate::shutdown::Shutdown;
use crate::sink::ErrorSink;
use crate::switches::ParameterBundle;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("invalid batch '{batch}' (options: {})", known.join(","))]
    InvalidBatch { batch: String, known: Vec<String> },

    #[error("batch '{batch}': {job} is listed before {dependency}, which it must run after")]
    OrderingViolation {
        batch: String,
        job: String,
        dependency: String,
    },
}

/// What happened during one walk over a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub batch: String,
    /// Executed rows in execution order.
    pub executed: Vec<(String, JobOutcome)>,
    /// Rows rejected by the only/exclude filter.
    pub skipped: Vec<String>,
    /// Set when an interrupt stopped the walk before the end of the table.
    pub interrupted: bool,
}

impl PipelineReport {
    pub fn succeeded(&self) -> usize {
        self.executed.iter().filter(|(_, o)| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.executed.len() - self.succeeded()
    }

    pub fn outcome_of(&self, job: &str) -> Option<&JobOutcome> {
        self.executed
            .iter()
            .find(|(name, _)| name == job)
            .map(|(_, outcome)| outcome)
    }
}

pub struct Pipeline<'a> {
    table: &'a PipelineTable,
    runner: JobRunner<'a>,
    shutdown: &'a Shutdown,
}

impl<'a> Pipeline<'a> {
    pub fn new(table: &'a PipelineTable, runner: JobRunner<'a>, shutdown: &'a Shutdown) -> Self {
        Self {
            table,
            runner,
            shutdown,
        }
    }

    /// Walk every row of `batch`. Only an unknown batch is an error; job
    /// failures end up in `sink` and in the returned report.
    pub fn execute(
        &self,
        batch: &str,
        filter: &JobFilter,
        bundle: &ParameterBundle,
        sink: &dyn ErrorSink,
    ) -> Result<PipelineReport, PipelineError> {
        let rows = self.table.rows_for(batch)?;
        let mut report = PipelineReport {
            batch: batch.to_string(),
            ..Default::default()
        };

        info!(
            batch,
            rows = rows.len(),
            filtered = !filter.is_unrestricted(),
            "starting batch"
        );

        for row in rows {
            if !filter.allows(row.name) {
                debug!(job = row.name, "filtered out");
                report.skipped.push(row.name.to_string());
                continue;
            }

            // Only a row that would actually run counts as cut short.
            if self.shutdown.is_requested() {
                warn!(batch, next = row.name, "interrupt received, stopping before next job");
                report.interrupted = true;
                break;
            }

            let outcome = self.runner.run(row, bundle, sink);
            report.executed.push((row.name.to_string(), outcome));
        }

        info!(
            batch,
            succeeded = report.succeeded(),
            failed = report.failed(),
            skipped = report.skipped.len(),
            interrupted = report.interrupted,
            "batch finished"
        );

        Ok(report)
    }
}
