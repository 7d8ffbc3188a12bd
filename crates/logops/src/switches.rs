//! Parse switches: the date-window and truncation filters shared by every
//! pipeline job that accepts them.
//!
//! A [`ParameterBundle`] is built once per invocation from [`RawSwitches`]
//! and never mutated afterwards. Construction normalizes the inputs:
//! - token lists are deduplicated and ordered; empty lists stay absent
//! - a range whose start is not strictly before its end loses its end bound

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwitchError {
    #[error("invalid year-month '{0}' (expected YYYY-MM)")]
    InvalidYearMonth(String),

    #[error("invalid year-month-day '{0}' (expected YYYY-MM-DD)")]
    InvalidYearMonthDay(String),

    #[error("--{0} must be a positive integer")]
    NonPositiveCount(&'static str),
}

/// A `YYYY-MM` token. Ordering is chronological, which matches natural
/// ordering of the canonical text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl FromStr for YearMonth {
    type Err = SwitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SwitchError::InvalidYearMonth(s.to_string());
        if s.len() != 7 {
            return Err(invalid());
        }
        let date = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
            .map_err(|_| invalid())?;
        Ok(Self {
            year: date.year(),
            month: date.month(),
        })
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// A `YYYY-MM-DD` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonthDay(NaiveDate);

impl FromStr for YearMonthDay {
    type Err = SwitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 10 {
            return Err(SwitchError::InvalidYearMonthDay(s.to_string()));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| SwitchError::InvalidYearMonthDay(s.to_string()))
    }
}

impl fmt::Display for YearMonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Unvalidated switch values as they arrive from the command line.
#[derive(Debug, Clone, Default)]
pub struct RawSwitches {
    pub year_months: Vec<String>,
    pub year_month_days: Vec<String>,
    pub start_year_month: Option<String>,
    pub end_year_month: Option<String>,
    pub start_year_month_day: Option<String>,
    pub end_year_month_day: Option<String>,
    pub first_n: Option<usize>,
    pub last_n: Option<usize>,
    pub wipe_out: bool,
}

/// Immutable parameter bundle handed to jobs that declare they need it.
///
/// `first_n` and `last_n` may both be set. Which one wins is up to the job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterBundle {
    year_months: Option<BTreeSet<YearMonth>>,
    year_month_days: Option<BTreeSet<YearMonthDay>>,
    start_year_month: Option<YearMonth>,
    end_year_month: Option<YearMonth>,
    start_year_month_day: Option<YearMonthDay>,
    end_year_month_day: Option<YearMonthDay>,
    first_n: Option<NonZeroUsize>,
    last_n: Option<NonZeroUsize>,
    wipe_out: bool,
}

impl ParameterBundle {
    pub fn from_raw(raw: &RawSwitches) -> Result<Self, SwitchError> {
        let year_months = parse_token_set::<YearMonth>(&raw.year_months)?;
        let year_month_days = parse_token_set::<YearMonthDay>(&raw.year_month_days)?;

        let start_year_month = parse_opt::<YearMonth>(raw.start_year_month.as_deref())?;
        let end_year_month = parse_opt::<YearMonth>(raw.end_year_month.as_deref())?;
        let start_year_month_day = parse_opt::<YearMonthDay>(raw.start_year_month_day.as_deref())?;
        let end_year_month_day = parse_opt::<YearMonthDay>(raw.end_year_month_day.as_deref())?;

        let first_n = positive(raw.first_n, "first-n")?;
        let last_n = positive(raw.last_n, "last-n")?;

        Ok(Self {
            year_months,
            year_month_days,
            end_year_month: repair_range(start_year_month, end_year_month),
            start_year_month,
            end_year_month_day: repair_range(start_year_month_day, end_year_month_day),
            start_year_month_day,
            first_n,
            last_n,
            wipe_out: raw.wipe_out,
        })
    }

    pub fn year_months(&self) -> Option<&BTreeSet<YearMonth>> {
        self.year_months.as_ref()
    }

    pub fn year_month_days(&self) -> Option<&BTreeSet<YearMonthDay>> {
        self.year_month_days.as_ref()
    }

    pub fn start_year_month(&self) -> Option<YearMonth> {
        self.start_year_month
    }

    pub fn end_year_month(&self) -> Option<YearMonth> {
        self.end_year_month
    }

    pub fn start_year_month_day(&self) -> Option<YearMonthDay> {
        self.start_year_month_day
    }

    pub fn end_year_month_day(&self) -> Option<YearMonthDay> {
        self.end_year_month_day
    }

    pub fn first_n(&self) -> Option<NonZeroUsize> {
        self.first_n
    }

    pub fn last_n(&self) -> Option<NonZeroUsize> {
        self.last_n
    }

    pub fn wipe_out(&self) -> bool {
        self.wipe_out
    }

    /// Render as command-line switches for an external job.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(set) = &self.year_months {
            args.push("--year-months".to_string());
            args.extend(set.iter().map(ToString::to_string));
        }
        if let Some(set) = &self.year_month_days {
            args.push("--year-month-days".to_string());
            args.extend(set.iter().map(ToString::to_string));
        }

        push_opt(&mut args, "--start-year-month", self.start_year_month);
        push_opt(&mut args, "--end-year-month", self.end_year_month);
        push_opt(&mut args, "--start-year-month-day", self.start_year_month_day);
        push_opt(&mut args, "--end-year-month-day", self.end_year_month_day);
        push_opt(&mut args, "--first-n", self.first_n);
        push_opt(&mut args, "--last-n", self.last_n);

        if self.wipe_out {
            args.push("--wipe-out".to_string());
        }

        args
    }
}

fn parse_token_set<T>(tokens: &[String]) -> Result<Option<BTreeSet<T>>, SwitchError>
where
    T: FromStr<Err = SwitchError> + Ord,
{
    if tokens.is_empty() {
        return Ok(None);
    }
    let set = tokens
        .iter()
        .map(|t| t.trim().parse::<T>())
        .collect::<Result<BTreeSet<T>, _>>()?;
    Ok(Some(set))
}

fn parse_opt<T>(token: Option<&str>) -> Result<Option<T>, SwitchError>
where
    T: FromStr<Err = SwitchError>,
{
    token.map(|t| t.trim().parse::<T>()).transpose()
}

fn positive(value: Option<usize>, flag: &'static str) -> Result<Option<NonZeroUsize>, SwitchError> {
    match value {
        None => Ok(None),
        Some(n) => NonZeroUsize::new(n)
            .map(Some)
            .ok_or(SwitchError::NonPositiveCount(flag)),
    }
}

/// Drop `end` when it does not come strictly after `start`.
fn repair_range<T: Ord + Copy>(start: Option<T>, end: Option<T>) -> Option<T> {
    match (start, end) {
        (Some(s), Some(e)) if s >= e => None,
        (_, end) => end,
    }
}

fn push_opt<T: fmt::Display>(args: &mut Vec<String>, flag: &str, value: Option<T>) {
    if let Some(value) = value {
        args.push(flag.to_string());
        args.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_year_month_parsing() {
        let ym: YearMonth = "2024-03".parse().unwrap();
        assert_eq!(ym.year(), 2024);
        assert_eq!(ym.month(), 3);
        assert_eq!(ym.to_string(), "2024-03");

        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("2024-3".parse::<YearMonth>().is_err());
        assert!("202403".parse::<YearMonth>().is_err());
        assert!("2024-03-01".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_year_month_day_parsing() {
        let ymd: YearMonthDay = "2024-02-29".parse().unwrap();
        assert_eq!(ymd.to_string(), "2024-02-29");

        assert!("2023-02-29".parse::<YearMonthDay>().is_err());
        assert!("2024-2-9".parse::<YearMonthDay>().is_err());
        assert!("yesterday".parse::<YearMonthDay>().is_err());
    }

    #[test]
    fn test_token_sets_deduplicated_and_sorted() {
        let raw = RawSwitches {
            year_months: strings(&["2024-11", "2024-02", "2024-11", "2023-12"]),
            year_month_days: strings(&["2024-01-10", "2024-01-02", "2024-01-10"]),
            ..Default::default()
        };
        let bundle = ParameterBundle::from_raw(&raw).unwrap();

        let months: Vec<String> = bundle
            .year_months()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(months, vec!["2023-12", "2024-02", "2024-11"]);

        let days: Vec<String> = bundle
            .year_month_days()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(days, vec!["2024-01-02", "2024-01-10"]);
    }

    #[test]
    fn test_empty_token_lists_stay_absent() {
        let bundle = ParameterBundle::from_raw(&RawSwitches::default()).unwrap();
        assert!(bundle.year_months().is_none());
        assert!(bundle.year_month_days().is_none());
        assert!(bundle.to_args().is_empty());
    }

    #[test]
    fn test_inverted_month_range_drops_end() {
        let raw = RawSwitches {
            start_year_month: Some("2024-05".to_string()),
            end_year_month: Some("2024-01".to_string()),
            ..Default::default()
        };
        let bundle = ParameterBundle::from_raw(&raw).unwrap();
        assert_eq!(bundle.start_year_month().unwrap().to_string(), "2024-05");
        assert!(bundle.end_year_month().is_none());
    }

    #[test]
    fn test_equal_bounds_drop_end() {
        let raw = RawSwitches {
            start_year_month_day: Some("2024-05-01".to_string()),
            end_year_month_day: Some("2024-05-01".to_string()),
            ..Default::default()
        };
        let bundle = ParameterBundle::from_raw(&raw).unwrap();
        assert!(bundle.start_year_month_day().is_some());
        assert!(bundle.end_year_month_day().is_none());
    }

    #[test]
    fn test_ordered_ranges_preserved() {
        let raw = RawSwitches {
            start_year_month: Some("2023-12".to_string()),
            end_year_month: Some("2024-01".to_string()),
            start_year_month_day: Some("2024-01-01".to_string()),
            end_year_month_day: Some("2024-01-31".to_string()),
            ..Default::default()
        };
        let bundle = ParameterBundle::from_raw(&raw).unwrap();
        assert_eq!(bundle.end_year_month().unwrap().to_string(), "2024-01");
        assert_eq!(bundle.end_year_month_day().unwrap().to_string(), "2024-01-31");
    }

    #[test]
    fn test_end_without_start_is_kept() {
        let raw = RawSwitches {
            end_year_month: Some("2024-01".to_string()),
            ..Default::default()
        };
        let bundle = ParameterBundle::from_raw(&raw).unwrap();
        assert!(bundle.start_year_month().is_none());
        assert_eq!(bundle.end_year_month().unwrap().to_string(), "2024-01");
    }

    #[test]
    fn test_counts_must_be_positive() {
        let raw = RawSwitches {
            first_n: Some(0),
            ..Default::default()
        };
        assert_eq!(
            ParameterBundle::from_raw(&raw),
            Err(SwitchError::NonPositiveCount("first-n"))
        );
    }

    #[test]
    fn test_invalid_token_rejected() {
        let raw = RawSwitches {
            year_months: strings(&["2024-01", "nope"]),
            ..Default::default()
        };
        assert_eq!(
            ParameterBundle::from_raw(&raw),
            Err(SwitchError::InvalidYearMonth("nope".to_string()))
        );
    }

    #[test]
    fn test_to_args() {
        let raw = RawSwitches {
            year_months: strings(&["2024-02", "2024-01"]),
            start_year_month_day: Some("2024-01-05".to_string()),
            first_n: Some(10),
            last_n: Some(3),
            wipe_out: true,
            ..Default::default()
        };
        let bundle = ParameterBundle::from_raw(&raw).unwrap();
        assert_eq!(
            bundle.to_args(),
            strings(&[
                "--year-months",
                "2024-01",
                "2024-02",
                "--start-year-month-day",
                "2024-01-05",
                "--first-n",
                "10",
                "--last-n",
                "3",
                "--wipe-out",
            ])
        );
    }
}
