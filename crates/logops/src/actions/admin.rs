//! `dumpdata`, `collectstatic`, `check-deploy`: plain management sub-commands.

use crate::pipeline::PipelineRow;
use crate::runner::{JobOutcome, JobRunner};
use crate::sink::ErrorSink;
use crate::switches::ParameterBundle;

pub fn run(command: &'static str, runner: &JobRunner<'_>, sink: &dyn ErrorSink) -> JobOutcome {
    let row = PipelineRow::new(command, false);
    runner.run(&row, &ParameterBundle::default(), sink)
}
