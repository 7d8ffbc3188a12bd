//! Command-line surface for logops.

pub mod error;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use logops::dispatch::Invocation;
use logops::switches::RawSwitches;

#[derive(Parser, Debug)]
#[command(name = "logops", about = "Operational actions for the log analyzer")]
pub struct Cli {
    /// Action to run (dumpdata, collectstatic, check-deploy, renew, update,
    /// check-trace, storage, parse, hourly-parse)
    #[arg(short = 'a', long)]
    pub action: Option<String>,

    /// Pipeline batch for parse and hourly-parse (one, two)
    #[arg(short = 'b', long)]
    pub batch: Option<String>,

    /// Reset demo data before batch one (prunes old logs)
    #[arg(short = 'd', long)]
    pub demo: bool,

    /// With --demo, wipe parsed data instead of pruning
    #[arg(short = 'c', long)]
    pub clean_demo: bool,

    /// Run only these jobs
    #[arg(short = 'o', long, num_args = 1..)]
    pub only: Vec<String>,

    /// Skip these jobs (wins over --only)
    #[arg(short = 'e', long, num_args = 1..)]
    pub exclude: Vec<String>,

    /// Explicit months, YYYY-MM
    #[arg(long, num_args = 1..)]
    pub year_months: Vec<String>,

    /// Explicit days, YYYY-MM-DD
    #[arg(long, num_args = 1..)]
    pub year_month_days: Vec<String>,

    #[arg(long)]
    pub start_year_month: Option<String>,

    #[arg(long)]
    pub end_year_month: Option<String>,

    #[arg(long)]
    pub start_year_month_day: Option<String>,

    #[arg(long)]
    pub end_year_month_day: Option<String>,

    /// Process only the first N items
    #[arg(long)]
    pub first_n: Option<usize>,

    /// Process only the last N items
    #[arg(long)]
    pub last_n: Option<usize>,

    /// Let jobs discard previously parsed output
    #[arg(long)]
    pub wipe_out: bool,

    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Settings file (defaults to $LOGOPS_HOME/config.toml)
    #[arg(long, env = "LOGOPS_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn invocation(&self) -> Invocation {
        Invocation {
            action: self.action.clone(),
            batch: self.batch.clone(),
            demo: self.demo,
            clean_demo: self.clean_demo,
            only: self.only.clone(),
            exclude: self.exclude.clone(),
            switches: RawSwitches {
                year_months: self.year_months.clone(),
                year_month_days: self.year_month_days.clone(),
                start_year_month: self.start_year_month.clone(),
                end_year_month: self.end_year_month.clone(),
                start_year_month_day: self.start_year_month_day.clone(),
                end_year_month_day: self.end_year_month_day.clone(),
                first_n: self.first_n,
                last_n: self.last_n,
                wipe_out: self.wipe_out,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_short_flags_and_lists() {
        let cli = Cli::try_parse_from([
            "logops", "-a", "parse", "-b", "two", "-o", "parse-dns", "update-dns", "-e",
            "update-dns", "--year-months", "2024-05", "2024-06", "--first-n", "3",
        ])
        .unwrap();
        let inv = cli.invocation();
        assert_eq!(inv.action.as_deref(), Some("parse"));
        assert_eq!(inv.batch.as_deref(), Some("two"));
        assert_eq!(inv.only, vec!["parse-dns", "update-dns"]);
        assert_eq!(inv.exclude, vec!["update-dns"]);
        assert_eq!(inv.switches.year_months, vec!["2024-05", "2024-06"]);
        assert_eq!(inv.switches.first_n, Some(3));
        assert!(!inv.demo);
    }

    #[test]
    fn test_action_is_optional_at_parse_time() {
        // A missing action is reported by the dispatcher, with suggestions.
        let cli = Cli::try_parse_from(["logops", "-d", "-c"]).unwrap();
        let inv = cli.invocation();
        assert!(inv.action.is_none());
        assert!(inv.demo && inv.clean_demo);
    }
}
