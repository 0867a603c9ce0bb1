//! Runs all loan parts of a mortgage in lockstep and records the combined payments

use log::debug;

use crate::amortization::PaymentRecord;
use crate::error::{MortgageError, MortgageResult};
use crate::loan_part::{LoanPartId, LoanPartTerms, LoanPartTracker};
use super::ledger::{Ledger, LedgerRow};

/// Result of a single mortgage step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A combined payment was recorded for this period
    Paid { period: u32 },
    /// No loan part had periods left; nothing was recorded
    Exhausted,
}

/// A mortgage composed of one or more loan parts
///
/// Each step pays one period on every loan part with periods left and
/// appends the sum of those payments to the ledger. Cloning a runner gives a
/// fully independent copy, which is how scenario branches are made.
#[derive(Debug, Clone, Default)]
pub struct MortgageRunner {
    loan_parts: Vec<LoanPartTracker>,
    active: Vec<bool>,
    period: u32,
    ledger: Ledger,
}

impl MortgageRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mortgage from loan part terms, in order
    pub fn from_terms(terms: &[LoanPartTerms], periods_per_year: u32) -> MortgageResult<Self> {
        let mut runner = Self::new();
        for part in terms {
            runner.add_loan_part(part.build(periods_per_year)?);
        }
        Ok(runner)
    }

    /// Append a loan part and return its id.
    ///
    /// Ids are unique within a mortgage: a clone of a loan part that is
    /// already present gets a fresh id, so use the returned one.
    pub fn add_loan_part(&mut self, mut loan_part: LoanPartTracker) -> LoanPartId {
        if self.index_of(loan_part.id()).is_some() {
            loan_part.reassign_id();
        }
        let id = loan_part.id();
        self.active.push(loan_part.remaining_periods() > 0);
        self.loan_parts.push(loan_part);
        id
    }

    pub fn add_named_loan_part(&mut self, loan_part: LoanPartTracker, name: &str) -> LoanPartId {
        self.add_loan_part(loan_part.with_name(name))
    }

    pub fn loan_parts(&self) -> &[LoanPartTracker] {
        &self.loan_parts
    }

    pub fn loan_part(&self, id: LoanPartId) -> Option<&LoanPartTracker> {
        self.loan_parts.iter().find(|part| part.id() == id)
    }

    pub fn index_of(&self, id: LoanPartId) -> Option<usize> {
        self.loan_parts.iter().position(|part| part.id() == id)
    }

    /// Whether each loan part, by position, still had periods left after the last step
    pub fn active(&self) -> &[bool] {
        &self.active
    }

    /// Number of recorded periods
    pub fn period(&self) -> u32 {
        self.period
    }

    pub fn has_started(&self) -> bool {
        self.period > 0
    }

    /// Pay one period on every loan part that has periods left
    pub fn step(&mut self) -> MortgageResult<StepOutcome> {
        let mut total = PaymentRecord::zero();
        let mut any_active = false;

        for (loan_part, active) in self.loan_parts.iter_mut().zip(self.active.iter_mut()) {
            if loan_part.remaining_periods() == 0 {
                *active = false;
                continue;
            }
            any_active = true;

            let payment = loan_part.next_payment()?;
            total += payment.record;
            *active = loan_part.remaining_periods() > 0;
        }

        if !any_active {
            return Ok(StepOutcome::Exhausted);
        }

        let period = self.ledger.append(total);
        self.period += 1;
        debug_assert_eq!(self.ledger.len(), self.period as usize);

        debug!(
            "Period {}: payment {:.2}, interest {:.2}, balance {:.2}",
            period,
            total.payment(),
            total.interest,
            total.amount_end()
        );

        Ok(StepOutcome::Paid { period })
    }

    /// Step until every loan part is paid off; returns the number of steps taken
    pub fn step_all(&mut self) -> MortgageResult<u32> {
        let mut steps = 0;
        while let StepOutcome::Paid { .. } = self.step()? {
            steps += 1;
        }
        Ok(steps)
    }

    /// Outstanding balance over all loan parts, paid off ones included
    pub fn current_amount(&self) -> f64 {
        self.loan_parts.iter().map(|part| part.current_amount()).sum()
    }

    /// Periods until the longest running loan part is done
    pub fn periods_remaining(&self) -> u32 {
        self.loan_parts
            .iter()
            .map(|part| part.remaining_periods())
            .max()
            .unwrap_or(0)
    }

    /// Swap the loan part with id `old` for `new`, keeping its position.
    ///
    /// The ledger and period counter are untouched; `new` takes part from the
    /// next step on. Returns the replaced loan part.
    pub fn replace_loan_part(&mut self, old: LoanPartId, new: LoanPartTracker) -> MortgageResult<LoanPartTracker> {
        let index = self.index_of(old).ok_or(MortgageError::NotFound(old))?;
        self.replace_at(index, new)
    }

    pub fn replace_loan_part_by_index(&mut self, index: usize, new: LoanPartTracker) -> MortgageResult<LoanPartTracker> {
        if index >= self.loan_parts.len() {
            return Err(MortgageError::invalid_input(
                "index",
                format!("{} out of range for {} loan parts", index, self.loan_parts.len()),
            ));
        }
        self.replace_at(index, new)
    }

    pub fn replace_loan_part_by_name(&mut self, name: &str, new: LoanPartTracker) -> MortgageResult<LoanPartTracker> {
        let index = self
            .loan_parts
            .iter()
            .position(|part| part.name() == Some(name))
            .ok_or_else(|| MortgageError::invalid_input("name", format!("no loan part named '{}'", name)))?;
        self.replace_at(index, new)
    }

    fn replace_at(&mut self, index: usize, mut new: LoanPartTracker) -> MortgageResult<LoanPartTracker> {
        if self.index_of(new.id()).is_some_and(|other| other != index) {
            new.reassign_id();
        }
        debug!(
            "Replacing loan part {} with {} at period {}",
            self.loan_parts[index].id(),
            new.id(),
            self.period
        );
        self.active[index] = new.remaining_periods() > 0;
        Ok(std::mem::replace(&mut self.loan_parts[index], new))
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Ledger rows in period order, starting at 0
    pub fn to_ledger(&self) -> Vec<LedgerRow> {
        self.ledger.rows()
    }
}
