//! Top-level action routing.
//!
//! Validation happens up front: a bad action, batch or switch aborts the
//! whole invocation before any job runs and is reported to the operator, not
//! to the error file. Past that point every failure is row-level and goes to
//! the action's [`FileErrorSink`].

use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

use thiserror::Error;
use tracing::info;

use crate::actions;
use crate::demo::{DemoLifecycleManager, DemoMode, DemoReport};
use crate::filter::JobFilter;
use crate::pipeline::{Pipeline, PipelineError, PipelineReport, PipelineTable};
use crate::runner::{JobInvoker, JobRunner};
use crate::settings::Settings;
use crate::shutdown::Shutdown;
use crate::sink::{ErrorSink, FileErrorSink};
use crate::switches::{ParameterBundle, RawSwitches, SwitchError};

/// Name used for error files: `<project_dir>/actions-error-<action>`.
pub const COMMAND_NAME: &str = "actions";

/// Batch that owns the demo data.
pub const DEMO_BATCH: &str = "one";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("no {0} specified")]
    MissingArgument(&'static str),

    #[error("invalid action '{action}' (options: {})", Action::names().join(","))]
    InvalidAction { action: String },

    #[error("invalid batch '{batch}' (options: {})", options.join(","))]
    InvalidBatch { batch: String, options: Vec<String> },

    #[error(transparent)]
    InvalidSwitch(#[from] SwitchError),

    #[error("pipeline table is inconsistent: {0}")]
    Table(PipelineError),
}

impl From<PipelineError> for DispatchError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidBatch { batch, known } => DispatchError::InvalidBatch {
                batch,
                options: known,
            },
            other => DispatchError::Table(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    DumpData,
    CollectStatic,
    CheckDeploy,
    Renew,
    Update,
    CheckTrace,
    Storage,
    Parse,
    HourlyParse,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::DumpData,
        Action::CollectStatic,
        Action::CheckDeploy,
        Action::Renew,
        Action::Update,
        Action::CheckTrace,
        Action::Storage,
        Action::Parse,
        Action::HourlyParse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::DumpData => "dumpdata",
            Action::CollectStatic => "collectstatic",
            Action::CheckDeploy => "check-deploy",
            Action::Renew => "renew",
            Action::Update => "update",
            Action::CheckTrace => "check-trace",
            Action::Storage => "storage",
            Action::Parse => "parse",
            Action::HourlyParse => "hourly-parse",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(Action::as_str).collect()
    }

    pub fn is_parse_family(&self) -> bool {
        matches!(self, Action::Parse | Action::HourlyParse)
    }
}

impl FromStr for Action {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| DispatchError::InvalidAction {
                action: s.to_string(),
            })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the operator asked for, as given.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub action: Option<String>,
    pub batch: Option<String>,
    pub demo: bool,
    pub clean_demo: bool,
    pub only: Vec<String>,
    pub exclude: Vec<String>,
    pub switches: RawSwitches,
}

/// A validated invocation.
#[derive(Debug, Clone)]
pub struct Request {
    pub action: Action,
    pub batch: Option<String>,
    pub demo: bool,
    pub clean_demo: bool,
    pub filter: JobFilter,
    pub bundle: ParameterBundle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A non-pipeline action ran; its failures, if any, are in the error file.
    Completed(Action),
    Pipeline {
        demo: Option<DemoReport>,
        report: PipelineReport,
    },
}

pub struct ActionDispatcher<'a> {
    settings: &'a Settings,
    invoker: &'a dyn JobInvoker,
    table: PipelineTable,
    shutdown: Shutdown,
    now: SystemTime,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(settings: &'a Settings, invoker: &'a dyn JobInvoker, shutdown: Shutdown) -> Self {
        Self {
            settings,
            invoker,
            table: PipelineTable::builtin(),
            shutdown,
            now: SystemTime::now(),
        }
    }

    pub fn with_table(mut self, table: PipelineTable) -> Self {
        self.table = table;
        self
    }

    /// Pin the clock used for demo pruning.
    pub fn with_clock(mut self, now: SystemTime) -> Self {
        self.now = now;
        self
    }

    /// Validate, then run with the action's file-backed error sink.
    pub fn dispatch(&self, invocation: &Invocation) -> Result<DispatchOutcome, DispatchError> {
        let request = self.validate(invocation)?;
        let sink = FileErrorSink::new(
            COMMAND_NAME,
            self.settings.host_name.clone(),
            FileErrorSink::error_file_for(
                &self.settings.project_dir,
                COMMAND_NAME,
                request.action.as_str(),
            ),
        );
        Ok(self.execute(&request, &sink))
    }

    /// Checks run in order: action, batch, then switches. Switches are only
    /// parsed for the actions that hand them to jobs.
    pub fn validate(&self, invocation: &Invocation) -> Result<Request, DispatchError> {
        let action: Action = invocation
            .action
            .as_deref()
            .ok_or(DispatchError::MissingArgument("action"))?
            .parse()?;

        let batch = if action.is_parse_family() {
            let batch = invocation
                .batch
                .clone()
                .ok_or(DispatchError::MissingArgument("batch"))?;
            // Resolve now so an unknown batch fails before anything runs.
            self.table.rows_for(&batch)?;
            self.table.validate()?;
            Some(batch)
        } else {
            None
        };

        let bundle = if action.is_parse_family() {
            ParameterBundle::from_raw(&invocation.switches)?
        } else {
            ParameterBundle::default()
        };

        Ok(Request {
            action,
            batch,
            demo: invocation.demo,
            clean_demo: invocation.clean_demo,
            filter: JobFilter::new(
                invocation.only.iter().cloned(),
                invocation.exclude.iter().cloned(),
            ),
            bundle,
        })
    }

    /// Run a validated request. Never fails: row-level problems go to `sink`.
    pub fn execute(&self, request: &Request, sink: &dyn ErrorSink) -> DispatchOutcome {
        let runner = JobRunner::new(self.invoker);
        info!(action = %request.action, batch = ?request.batch, "dispatching");

        let batch = match (request.action, request.batch.as_deref()) {
            (Action::DumpData | Action::CollectStatic | Action::CheckDeploy, _) => {
                actions::admin::run(request.action.as_str(), &runner, sink);
                return DispatchOutcome::Completed(request.action);
            }
            (Action::Renew, _) => {
                actions::renew::run(self.settings, sink);
                return DispatchOutcome::Completed(request.action);
            }
            (Action::Update, _) => {
                actions::update::run(self.settings, sink);
                return DispatchOutcome::Completed(request.action);
            }
            (Action::CheckTrace, _) => {
                actions::trace::run(self.settings, sink);
                return DispatchOutcome::Completed(request.action);
            }
            (Action::Storage, _) => {
                actions::storage::run(self.settings, sink);
                return DispatchOutcome::Completed(request.action);
            }
            (Action::Parse | Action::HourlyParse, Some(batch)) => batch,
            (Action::Parse | Action::HourlyParse, None) => {
                sink.record("parse requested without a batch");
                return DispatchOutcome::Completed(request.action);
            }
        };

        let demo = if self.wants_demo_reset(request, batch) {
            let mode = if request.clean_demo {
                DemoMode::Clean
            } else {
                DemoMode::Prune
            };
            let manager = DemoLifecycleManager::new(
                &self.settings.logs_dir,
                &self.settings.logs_parsed_dir,
                self.settings.reserved_parsed_dir.clone(),
                self.settings.max_demo_log_days,
            );
            Some(manager.prepare(mode, self.now, &runner, sink))
        } else {
            None
        };

        let pipeline = Pipeline::new(&self.table, runner, &self.shutdown);
        let report = match pipeline.execute(batch, &request.filter, &request.bundle, sink) {
            Ok(report) => report,
            Err(err) => {
                // Batches were resolved during validation.
                sink.record(&err.to_string());
                PipelineReport {
                    batch: batch.to_string(),
                    ..Default::default()
                }
            }
        };

        DispatchOutcome::Pipeline { demo, report }
    }

    fn wants_demo_reset(&self, request: &Request, batch: &str) -> bool {
        request.action == Action::Parse
            && self.settings.is_demo
            && request.demo
            && batch == DEMO_BATCH
    }
}
