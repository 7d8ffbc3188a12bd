//! Terminal summaries for dispatch results

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use logops::demo::DemoReport;
use logops::dispatch::DispatchOutcome;
use logops::pipeline::PipelineReport;
use logops::runner::JobOutcome;

fn report_table(report: &PipelineReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Job").fg(Color::Cyan),
            Cell::new("Status").fg(Color::Cyan),
            Cell::new("Cause").fg(Color::Cyan),
        ]);

    for (job, outcome) in &report.executed {
        let (status, cause) = match outcome {
            JobOutcome::Success => (Cell::new("ok").fg(Color::Green), String::new()),
            JobOutcome::Failure { cause } => {
                let first = cause.lines().next().unwrap_or_default().to_string();
                (Cell::new("failed").fg(Color::Red), first)
            }
        };
        table.add_row(vec![Cell::new(job), status, Cell::new(cause)]);
    }
    for job in &report.skipped {
        table.add_row(vec![
            Cell::new(job),
            Cell::new("skipped").fg(Color::Grey),
            Cell::new(""),
        ]);
    }
    table
}

fn print_demo(demo: &DemoReport) {
    println!(
        "Demo reset: removed {} entries, {} failures, regenerated: {}",
        demo.removed.len(),
        demo.failures,
        if demo.regenerated { "yes" } else { "no" }
    );
}

pub fn print_outcome(outcome: &DispatchOutcome) {
    match outcome {
        DispatchOutcome::Completed(action) => println!("{} finished", action),
        DispatchOutcome::Pipeline { demo, report } => {
            if let Some(demo) = demo {
                print_demo(demo);
            }
            println!("Batch {}", report.batch);
            println!("{}", report_table(report));
            println!(
                "{} succeeded, {} failed, {} skipped{}",
                report.succeeded(),
                report.failed(),
                report.skipped.len(),
                if report.interrupted { " (interrupted)" } else { "" }
            );
        }
    }
}
