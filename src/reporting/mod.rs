//! Reporting views over a mortgage ledger

mod year_grouping;

pub use year_grouping::{group_by_year, group_ledger_by_year, parse_start_month, Aggregation, Column, YearSummary};
