//! Job execution with fault containment.
//!
//! The individual parse/fetch/update jobs live outside this crate. They are
//! reached through [`JobInvoker`]; [`JobRunner`] is the only caller and makes
//! sure nothing a job does (error or panic) escapes the current row.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};

use crate::pipeline::PipelineRow;
use crate::sink::ErrorSink;
use crate::switches::ParameterBundle;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("no program configured to run {job}")]
    NoProgram { job: String },

    #[error("failed to start {job}: {source}")]
    Spawn {
        job: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{job} exited with {status}: {stderr}")]
    Failed {
        job: String,
        status: String,
        stderr: String,
    },

    #[error("{job}: {message}")]
    Other { job: String, message: String },
}

/// Contract with external job implementations: run `job`, with the bundle
/// when one is given, and report success or failure.
pub trait JobInvoker {
    fn invoke(&self, job: &str, bundle: Option<&ParameterBundle>) -> Result<(), JobError>;
}

/// Runs jobs as management sub-commands: `<program...> <job> [switches...]`.
#[derive(Debug, Clone)]
pub struct CommandInvoker {
    program: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl CommandInvoker {
    pub fn new(program: Vec<String>) -> Self {
        Self {
            program,
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Full argument vector for one invocation, program first.
    pub fn argv(&self, job: &str, bundle: Option<&ParameterBundle>) -> Vec<String> {
        let mut argv = self.program.clone();
        argv.push(job.to_string());
        if let Some(bundle) = bundle {
            argv.extend(bundle.to_args());
        }
        argv
    }
}

impl JobInvoker for CommandInvoker {
    fn invoke(&self, job: &str, bundle: Option<&ParameterBundle>) -> Result<(), JobError> {
        if self.program.is_empty() {
            return Err(JobError::NoProgram {
                job: job.to_string(),
            });
        }
        let argv = self.argv(job, bundle);

        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        debug!(?argv, "spawning job");
        let output = cmd.output().map_err(|source| JobError::Spawn {
            job: job.to_string(),
            source,
        })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(JobError::Failed {
                job: job.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// Result of running one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Success,
    Failure { cause: String },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success)
    }
}

pub struct JobRunner<'a> {
    invoker: &'a dyn JobInvoker,
}

impl<'a> JobRunner<'a> {
    pub fn new(invoker: &'a dyn JobInvoker) -> Self {
        Self { invoker }
    }

    /// Run one row. Failures are recorded to `sink` and returned as
    /// [`JobOutcome::Failure`]; they never propagate.
    pub fn run(
        &self,
        row: &PipelineRow,
        bundle: &ParameterBundle,
        sink: &dyn ErrorSink,
    ) -> JobOutcome {
        let params = row.needs_parameters.then_some(bundle);
        let started = Instant::now();
        info!(job = row.name, with_params = row.needs_parameters, "running job");

        let result =
            panic::catch_unwind(AssertUnwindSafe(|| self.invoker.invoke(row.name, params)));

        let cause = match result {
            Ok(Ok(())) => {
                info!(
                    job = row.name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "job finished"
                );
                return JobOutcome::Success;
            }
            Ok(Err(err)) => err.to_string(),
            Err(payload) => format!("{} {}", row.name, panic_message(payload.as_ref())),
        };

        sink.record(&cause);
        JobOutcome::Failure { cause }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
