//! Logops - operational action dispatcher for the log analyzer.
//!
//! The interesting part is the parse engine: a fixed, ordered table of jobs
//! per batch, narrowed by only/exclude sets, fed a shared [`ParameterBundle`]
//! and executed row by row with per-row fault containment.

pub mod actions;
pub mod demo;
pub mod dispatch;
pub mod filter;
pub mod pipeline;
pub mod runner;
pub mod settings;
pub mod shutdown;
pub mod sink;
pub mod switches;

pub use dispatch::{Action, ActionDispatcher, DispatchError, DispatchOutcome, Invocation};
pub use filter::JobFilter;
pub use pipeline::{Pipeline, PipelineReport, PipelineRow, PipelineTable};
pub use runner::{CommandInvoker, JobError, JobInvoker, JobOutcome, JobRunner};
pub use settings::Settings;
pub use shutdown::Shutdown;
pub use sink::{ErrorSink, FileErrorSink, MemorySink};
pub use switches::{ParameterBundle, RawSwitches, YearMonth, YearMonthDay};
