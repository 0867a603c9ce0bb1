//! Aggregate a monthly ledger into calendar years

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{MortgageError, MortgageResult};
use crate::mortgage::{Ledger, LedgerRow};

/// Value columns of a ledger row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    AmountBoy,
    Payment,
    Interest,
    Repayment,
    AmountEnd,
}

/// How a column is reduced over the periods of a year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    First,
    Sum,
    Last,
}

impl Column {
    pub const ALL: [Column; 5] = [
        Column::AmountBoy,
        Column::Payment,
        Column::Interest,
        Column::Repayment,
        Column::AmountEnd,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::AmountBoy => "amount_boy",
            Column::Payment => "payment",
            Column::Interest => "interest",
            Column::Repayment => "repayment",
            Column::AmountEnd => "amount_end",
        }
    }

    pub fn aggregation(&self) -> Aggregation {
        match self {
            Column::AmountBoy => Aggregation::First,
            Column::AmountEnd => Aggregation::Last,
            Column::Payment | Column::Interest | Column::Repayment => Aggregation::Sum,
        }
    }

    pub fn value(&self, row: &LedgerRow) -> f64 {
        match self {
            Column::AmountBoy => row.amount_boy,
            Column::Payment => row.payment,
            Column::Interest => row.interest,
            Column::Repayment => row.repayment,
            Column::AmountEnd => row.amount_end,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = MortgageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "amount_boy" | "amount" => Ok(Column::AmountBoy),
            "payment" => Ok(Column::Payment),
            "interest" => Ok(Column::Interest),
            "repayment" => Ok(Column::Repayment),
            "amount_end" => Ok(Column::AmountEnd),
            other => Err(MortgageError::UnknownColumn(other.to_string())),
        }
    }
}

/// Aggregated values of one calendar year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSummary {
    pub year: i32,
    pub values: BTreeMap<Column, f64>,
}

impl YearSummary {
    pub fn get(&self, column: Column) -> Option<f64> {
        self.values.get(&column).copied()
    }
}

/// Parse the month of the first ledger period, as `YYYY-MM` or `YYYY`
pub fn parse_start_month(start_month: &str) -> MortgageResult<NaiveDate> {
    let invalid = || MortgageError::InvalidDate(start_month.to_string());
    let mut parts = start_month.trim().splitn(2, '-');

    let year: i32 = parts
        .next()
        .and_then(|y| y.parse().ok())
        .ok_or_else(invalid)?;
    let month: u32 = match parts.next() {
        Some(m) => m.parse().map_err(|_| invalid())?,
        None => 1,
    };

    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)
}

/// Group monthly ledger rows by calendar year.
///
/// Row `i` falls in the month `start_month + i`. Only the requested columns
/// are aggregated; an empty selection means all of them. Column names outside
/// the ledger's value columns are rejected.
pub fn group_by_year(
    rows: &[LedgerRow],
    start_month: &str,
    columns: &[&str],
) -> MortgageResult<Vec<YearSummary>> {
    let mut selected: Vec<Column> = columns
        .iter()
        .map(|name| name.parse())
        .collect::<MortgageResult<_>>()?;
    if selected.is_empty() {
        selected = Column::ALL.to_vec();
    }
    selected.sort();
    selected.dedup();

    let start = parse_start_month(start_month)?;
    let mut years: Vec<YearSummary> = Vec::new();

    for (offset, row) in rows.iter().enumerate() {
        let date = start
            .checked_add_months(Months::new(offset as u32))
            .ok_or_else(|| MortgageError::InvalidDate(format!("{} + {} months", start_month, offset)))?;
        let year = date.year();

        match years.last_mut() {
            Some(summary) if summary.year == year => {
                for column in &selected {
                    let value = column.value(row);
                    let entry = summary.values.entry(*column).or_insert(0.0);
                    match column.aggregation() {
                        Aggregation::First => {}
                        Aggregation::Sum => *entry += value,
                        Aggregation::Last => *entry = value,
                    }
                }
            }
            _ => {
                let values = selected.iter().map(|c| (*c, c.value(row))).collect();
                years.push(YearSummary { year, values });
            }
        }
    }

    Ok(years)
}

/// Group a ledger by calendar year
pub fn group_ledger_by_year(
    ledger: &Ledger,
    start_month: &str,
    columns: &[&str],
) -> MortgageResult<Vec<YearSummary>> {
    group_by_year(&ledger.rows(), start_month, columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2400 repaid in 24 monthly steps of 100
    fn straight_line_rows() -> Vec<LedgerRow> {
        (0..24)
            .map(|i| {
                let amount = (24 - i) as f64 * 100.0;
                LedgerRow {
                    period: i,
                    amount_boy: amount,
                    payment: 100.0,
                    interest: 0.0,
                    repayment: 100.0,
                    amount_end: amount - 100.0,
                }
            })
            .collect()
    }

    #[test]
    fn test_group_by_year() {
        let years = group_by_year(&straight_line_rows(), "2020-09", &["amount", "repayment", "amount_end"]).unwrap();

        let expected = [
            (2020, 2400.0, 400.0, 2000.0),
            (2021, 2000.0, 1200.0, 800.0),
            (2022, 800.0, 800.0, 0.0),
        ];
        assert_eq!(years.len(), 3);
        for (summary, (year, amount, repayment, amount_end)) in years.iter().zip(expected) {
            assert_eq!(summary.year, year);
            assert_eq!(summary.get(Column::AmountBoy), Some(amount));
            assert_eq!(summary.get(Column::Repayment), Some(repayment));
            assert_eq!(summary.get(Column::AmountEnd), Some(amount_end));
            assert_eq!(summary.get(Column::Interest), None);
        }
    }

    #[test]
    fn test_all_columns_by_default() {
        let years = group_by_year(&straight_line_rows(), "2021", &[]).unwrap();

        assert_eq!(years.len(), 2);
        assert_eq!(years[0].values.len(), 5);
        assert_eq!(years[0].get(Column::Payment), Some(1200.0));
        assert_eq!(years[1].get(Column::AmountEnd), Some(0.0));
    }

    #[test]
    fn test_unknown_column_rejected() {
        let result = group_by_year(&straight_line_rows(), "2020-09", &["repayment", "fees"]);
        assert_eq!(result.unwrap_err(), MortgageError::UnknownColumn("fees".to_string()));
    }

    #[test]
    fn test_invalid_start_month() {
        for start in ["2020-13", "twenty", "2020-xx", ""] {
            let result = group_by_year(&straight_line_rows(), start, &[]);
            assert!(matches!(result, Err(MortgageError::InvalidDate(_))), "Accepted {:?}", start);
        }
    }

    #[test]
    fn test_empty_ledger() {
        let years = group_ledger_by_year(&Ledger::new(), "2020-01", &["payment"]).unwrap();
        assert!(years.is_empty());
    }
}
