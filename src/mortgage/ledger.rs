//! Ledger of combined per-period payments of a mortgage

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::amortization::PaymentRecord;

/// Combined payment of all loan parts in one period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub period: u32,
    pub record: PaymentRecord,
}

impl LedgerEntry {
    pub fn row(&self) -> LedgerRow {
        LedgerRow {
            period: self.period,
            amount_boy: self.record.amount_boy,
            payment: self.record.payment(),
            interest: self.record.interest,
            repayment: self.record.repayment,
            amount_end: self.record.amount_end(),
        }
    }
}

/// Flat view of a ledger entry with derived fields, used for output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub period: u32,
    pub amount_boy: f64,
    pub payment: f64,
    pub interest: f64,
    pub repayment: f64,
    pub amount_end: f64,
}

/// Append-only sequence of ledger entries, ordered by period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the record of the next period and return its period index
    pub(crate) fn append(&mut self, record: PaymentRecord) -> u32 {
        let period = self.entries.len() as u32;
        self.entries.push(LedgerEntry { period, record });
        period
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn get(&self, period: u32) -> Option<&LedgerEntry> {
        self.entries.get(period as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter()
    }

    pub fn rows(&self) -> Vec<LedgerRow> {
        self.entries.iter().map(LedgerEntry::row).collect()
    }

    /// Write all rows as CSV with a header line
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for entry in &self.entries {
            wtr.serialize(entry.row())?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Get summary statistics
    pub fn summary(&self) -> LedgerSummary {
        let total_interest: f64 = self.entries.iter().map(|e| e.record.interest).sum();
        let total_repayment: f64 = self.entries.iter().map(|e| e.record.repayment).sum();

        let initial_amount = self.entries.first().map(|e| e.record.amount_boy).unwrap_or(0.0);
        let final_amount = self.entries.last().map(|e| e.record.amount_end()).unwrap_or(0.0);

        LedgerSummary {
            total_periods: self.entries.len() as u32,
            total_payment: total_interest + total_repayment,
            total_interest,
            total_repayment,
            initial_amount,
            final_amount,
        }
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a LedgerEntry;
    type IntoIter = std::slice::Iter<'a, LedgerEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Summary statistics for a ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub total_periods: u32,
    pub total_payment: f64,
    pub total_interest: f64,
    pub total_repayment: f64,
    pub initial_amount: f64,
    pub final_amount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.append(PaymentRecord::new(300.0, 3.0, 100.0));
        ledger.append(PaymentRecord::new(200.0, 2.0, 100.0));
        ledger.append(PaymentRecord::new(100.0, 1.0, 100.0));
        ledger
    }

    #[test]
    fn test_periods_follow_insertion_order() {
        let ledger = sample_ledger();
        let periods: Vec<u32> = ledger.iter().map(|e| e.period).collect();
        assert_eq!(periods, vec![0, 1, 2]);
        assert_eq!(ledger.get(1).unwrap().record.amount_boy, 200.0);
        assert!(ledger.get(3).is_none());
    }

    #[test]
    fn test_row_has_derived_fields() {
        let row = sample_ledger().rows()[0];
        assert_eq!(row.payment, 103.0);
        assert_eq!(row.amount_end, 200.0);
    }

    #[test]
    fn test_summary() {
        let summary = sample_ledger().summary();
        assert_eq!(summary.total_periods, 3);
        assert_eq!(summary.total_interest, 6.0);
        assert_eq!(summary.total_repayment, 300.0);
        assert_eq!(summary.total_payment, 306.0);
        assert_eq!(summary.initial_amount, 300.0);
        assert_eq!(summary.final_amount, 0.0);
    }

    #[test]
    fn test_write_csv() {
        let mut buffer = Vec::new();
        sample_ledger().write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();

        assert_eq!(lines.next(), Some("period,amount_boy,payment,interest,repayment,amount_end"));
        assert_eq!(lines.next(), Some("0,300.0,103.0,3.0,100.0,200.0"));
        assert_eq!(text.lines().count(), 4);
    }
}
