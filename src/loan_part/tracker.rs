//! Stateful loan part that tracks its balance and period while paying off

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::amortization::{periodic_rate, AmortizationGenerator, PaymentRecord};
use crate::error::{MortgageError, MortgageResult};

static NEXT_LOAN_PART_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a loan part, used to locate it inside a mortgage.
///
/// Every constructed tracker gets a fresh id. Cloning a tracker keeps the id,
/// so a deep copy of a mortgage can be addressed with the ids of the original.
/// Inside one mortgage ids stay unique: a clone added next to its original
/// is given a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LoanPartId(u64);

impl LoanPartId {
    fn next() -> Self {
        LoanPartId(NEXT_LOAN_PART_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for LoanPartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A payment of one loan part, stamped with its position in the schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanPartPayment {
    /// Period of the loan part this payment belongs to (0-indexed)
    pub period: u32,

    /// Periods left before this payment was made
    pub remaining: u32,

    pub record: PaymentRecord,
}

/// Generates the payments of one loan part and keeps track of the
/// current balance and period.
///
/// Rate changes and prepayments never modify a tracker in place: they build a
/// new tracker starting from the current state, which the owning mortgage can
/// swap in.
#[derive(Debug, Clone)]
pub struct LoanPartTracker {
    id: LoanPartId,
    name: Option<String>,

    start_amount: f64,
    n_periods: u32,
    rate: f64,
    future_value: f64,
    fixed_surcharge: f64,

    current_period: u32,
    current_amount: f64,

    /// Untouched schedule, cloned on reset
    initial_schedule: AmortizationGenerator,
    schedule: AmortizationGenerator,
}

impl LoanPartTracker {
    /// Annuity loan part with a periodic rate, no future value and no surcharge
    pub fn new(amount: f64, rate: f64, periods: u32) -> MortgageResult<Self> {
        Self::with_options(amount, rate, periods, 0.0, 0.0)
    }

    /// Loan part with a periodic rate and explicit future value and fixed surcharge
    pub fn with_options(
        amount: f64,
        rate: f64,
        periods: u32,
        future_value: f64,
        fixed_surcharge: f64,
    ) -> MortgageResult<Self> {
        let schedule = AmortizationGenerator::new(amount, rate, periods, future_value, fixed_surcharge)?;

        Ok(Self {
            id: LoanPartId::next(),
            name: None,
            start_amount: amount,
            n_periods: periods,
            rate,
            future_value,
            fixed_surcharge,
            current_period: 0,
            current_amount: amount,
            initial_schedule: schedule.clone(),
            schedule,
        })
    }

    /// Loan part given an annual rate and a term in years.
    ///
    /// The term is scaled to `years * periods_per_year` periods and the rate
    /// is converted to the equivalent periodic rate.
    pub fn from_annual_rate(
        amount: f64,
        annual_rate: f64,
        years: u32,
        future_value: f64,
        fixed_surcharge: f64,
        periods_per_year: u32,
    ) -> MortgageResult<Self> {
        if periods_per_year < 1 {
            return Err(MortgageError::invalid_input(
                "periods_per_year",
                "at least one period per year is required",
            ));
        }
        let periods = years.checked_mul(periods_per_year).ok_or_else(|| {
            MortgageError::invalid_input(
                "periods",
                format!("{} years of {} periods overflows", years, periods_per_year),
            )
        })?;

        Self::with_options(
            amount,
            periodic_rate(annual_rate, periods_per_year),
            periods,
            future_value,
            fixed_surcharge,
        )
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(&self) -> LoanPartId {
        self.id
    }

    /// Give this tracker a fresh id, used when a clone joins the mortgage of its original
    pub(crate) fn reassign_id(&mut self) {
        self.id = LoanPartId::next();
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn start_amount(&self) -> f64 {
        self.start_amount
    }

    pub fn n_periods(&self) -> u32 {
        self.n_periods
    }

    /// Periodic interest rate
    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn future_value(&self) -> f64 {
        self.future_value
    }

    pub fn fixed_surcharge(&self) -> f64 {
        self.fixed_surcharge
    }

    pub fn current_period(&self) -> u32 {
        self.current_period
    }

    /// Balance after the most recent payment
    pub fn current_amount(&self) -> f64 {
        self.current_amount
    }

    pub fn remaining_periods(&self) -> u32 {
        self.n_periods - self.current_period
    }

    /// Fixed payment per period of the underlying schedule
    pub fn payment_amount(&self) -> f64 {
        self.schedule.payment_amount()
    }

    /// Restart the schedule from the start amount
    pub fn reset(&mut self) {
        self.current_period = 0;
        self.current_amount = self.start_amount;
        self.schedule = self.initial_schedule.clone();
    }

    /// Pay the next period
    pub fn next_payment(&mut self) -> MortgageResult<LoanPartPayment> {
        let exhausted = MortgageError::Exhausted {
            loan_part: self.id,
            periods: self.n_periods,
        };
        if self.remaining_periods() == 0 {
            return Err(exhausted);
        }
        let record = self.schedule.next().ok_or(exhausted)?;

        let payment = LoanPartPayment {
            period: self.current_period,
            remaining: self.remaining_periods(),
            record,
        };

        self.current_amount = record.amount_end();
        self.current_period += 1;

        Ok(payment)
    }

    /// Settlement record of the schedule, available once every period is paid
    pub fn settlement(&self) -> Option<PaymentRecord> {
        if self.remaining_periods() > 0 {
            return None;
        }
        self.schedule.clone().next()
    }

    /// New loan part continuing from the current balance and remaining
    /// periods, at a different periodic rate
    pub fn clone_with_rate(&self, new_rate: f64) -> MortgageResult<LoanPartTracker> {
        debug!(
            "Loan part {} rate change {:.6} -> {:.6} at period {}",
            self.id, self.rate, new_rate, self.current_period
        );

        let mut tracker = LoanPartTracker::with_options(
            self.current_amount,
            new_rate,
            self.remaining_periods(),
            self.future_value,
            self.fixed_surcharge,
        )?;
        tracker.name = self.name.clone();
        Ok(tracker)
    }

    /// New loan part continuing from the current balance reduced by a
    /// prepayment, at the same rate and over the remaining periods
    pub fn clone_with_prepayment(&self, amount: f64) -> MortgageResult<LoanPartTracker> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(MortgageError::invalid_input(
                "prepayment",
                format!("{} is not a valid prepayment amount", amount),
            ));
        }
        if amount > self.current_amount {
            return Err(MortgageError::invalid_input(
                "prepayment",
                format!("{:.2} exceeds outstanding balance {:.2}", amount, self.current_amount),
            ));
        }

        let balance = self.current_amount - amount;
        debug!(
            "Loan part {} prepayment {:.2} at period {}, balance {:.2}",
            self.id, amount, self.current_period, balance
        );

        let mut tracker = LoanPartTracker::with_options(
            balance,
            self.rate,
            self.remaining_periods(),
            self.future_value.min(balance),
            self.fixed_surcharge,
        )?;
        tracker.name = self.name.clone();
        Ok(tracker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::MONTHS_PER_YEAR;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_next_updates_internal_state() {
        let mut loan = LoanPartTracker::new(1000.0, 0.01, 2).unwrap();
        let payment = loan.next_payment().unwrap();

        assert_eq!(payment.period, 0);
        assert_eq!(payment.remaining, 2);
        assert_eq!(loan.remaining_periods(), 1);
        assert_eq!(loan.current_period(), 1);
        assert_eq!(loan.current_amount(), payment.record.amount_end());
    }

    #[test]
    fn test_exhausted_after_all_periods() {
        let mut loan = LoanPartTracker::new(1000.0, 0.01, 2).unwrap();
        loan.next_payment().unwrap();
        loan.next_payment().unwrap();

        match loan.next_payment() {
            Err(MortgageError::Exhausted { loan_part, periods }) => {
                assert_eq!(loan_part, loan.id());
                assert_eq!(periods, 2);
            }
            other => panic!("Expected exhaustion, got {:?}", other),
        }
        assert_eq!(loan.remaining_periods(), 0);
    }

    #[test]
    fn test_reset_restarts_schedule() {
        let mut loan = LoanPartTracker::new(1000.0, 0.01, 12).unwrap();
        let first = loan.next_payment().unwrap();
        loan.next_payment().unwrap();

        loan.reset();
        assert_eq!(loan.current_period(), 0);
        assert_eq!(loan.current_amount(), 1000.0);
        assert_eq!(loan.next_payment().unwrap(), first);
    }

    #[test]
    fn test_settlement_only_after_payoff() {
        let mut loan = LoanPartTracker::new(100.0, 0.01, 3).unwrap();
        assert!(loan.settlement().is_none());

        let mut last = None;
        while loan.remaining_periods() > 0 {
            last = Some(loan.next_payment().unwrap().record);
        }
        let last = last.unwrap();
        let settlement = loan.settlement().unwrap();

        assert_eq!(settlement.amount_boy, last.amount_end());
        assert_eq!(settlement.repayment, last.repayment);
        // peeking does not consume anything
        assert_eq!(loan.settlement(), Some(settlement));
    }

    #[test]
    fn test_annual_rate_constructor() {
        let loan = LoanPartTracker::from_annual_rate(100.0, 0.01, 1, 0.0, 0.0, MONTHS_PER_YEAR).unwrap();

        assert_eq!(loan.n_periods(), 12);
        assert_relative_eq!(loan.rate(), 1.01_f64.powf(1.0 / 12.0) - 1.0);
        assert_abs_diff_eq!(loan.payment_amount(), 8.37833, epsilon = 1e-5);
    }

    #[test]
    fn test_yearly_schedule_pays_off() {
        let mut loan = LoanPartTracker::from_annual_rate(100.0, 0.01, 1, 0.0, 0.0, MONTHS_PER_YEAR).unwrap();

        let first = loan.next_payment().unwrap().record;
        assert_abs_diff_eq!(first.interest, 0.0829538, epsilon = 1e-7);
        assert_abs_diff_eq!(first.repayment, 8.29538, epsilon = 1e-5);

        let mut last = first;
        while loan.remaining_periods() > 0 {
            last = loan.next_payment().unwrap().record;
        }
        assert_abs_diff_eq!(last.amount_boy, 8.37139, epsilon = 1e-5);
        assert_abs_diff_eq!(last.amount_end(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_clone_with_rate_continues_from_current_state() {
        let mut loan = LoanPartTracker::new(1000.0, 0.01, 10).unwrap().with_name("annuity");
        for _ in 0..4 {
            loan.next_payment().unwrap();
        }

        let repriced = loan.clone_with_rate(0.005).unwrap();
        assert_ne!(repriced.id(), loan.id());
        assert_eq!(repriced.name(), Some("annuity"));
        assert_eq!(repriced.start_amount(), loan.current_amount());
        assert_eq!(repriced.n_periods(), 6);
        assert_eq!(repriced.rate(), 0.005);
        assert_eq!(repriced.current_period(), 0);

        // original is untouched
        assert_eq!(loan.current_period(), 4);
        assert_eq!(loan.rate(), 0.01);
    }

    #[test]
    fn test_clone_with_same_rate_reproduces_schedule() {
        let mut loan = LoanPartTracker::new(1000.0, 0.01, 10).unwrap();
        for _ in 0..3 {
            loan.next_payment().unwrap();
        }
        let mut branch = loan.clone_with_rate(loan.rate()).unwrap();

        while loan.remaining_periods() > 0 {
            let expected = loan.next_payment().unwrap().record;
            let actual = branch.next_payment().unwrap().record;
            assert_relative_eq!(actual.repayment, expected.repayment, epsilon = 1e-9);
            assert_relative_eq!(actual.interest, expected.interest, epsilon = 1e-9);
        }
        assert_abs_diff_eq!(branch.current_amount(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut loan = LoanPartTracker::new(500.0, 0.002, 24).unwrap();
        let snapshot = loan.clone();

        loan.next_payment().unwrap();
        assert_eq!(snapshot.current_period(), 0);
        assert_eq!(snapshot.current_amount(), 500.0);
        assert_eq!(snapshot.id(), loan.id());
    }

    #[test]
    fn test_clone_with_prepayment() {
        let mut loan = LoanPartTracker::with_options(1000.0, 0.01, 10, 0.0, 1.5).unwrap();
        for _ in 0..5 {
            loan.next_payment().unwrap();
        }

        let prepaid = loan.clone_with_prepayment(100.0).unwrap();
        assert_relative_eq!(prepaid.start_amount(), loan.current_amount() - 100.0);
        assert_eq!(prepaid.n_periods(), 5);
        assert_eq!(prepaid.fixed_surcharge(), 1.5);
        assert!(prepaid.payment_amount() < loan.payment_amount());

        assert!(matches!(
            loan.clone_with_prepayment(loan.current_amount() + 1.0),
            Err(MortgageError::InvalidInput { .. })
        ));
        assert!(matches!(
            loan.clone_with_prepayment(-5.0),
            Err(MortgageError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_interest_only_prepayment_caps_future_value() {
        let loan = LoanPartTracker::with_options(1000.0, 0.01, 10, 1000.0, 0.0).unwrap();
        let prepaid = loan.clone_with_prepayment(400.0).unwrap();

        assert_eq!(prepaid.future_value(), 600.0);
        assert_abs_diff_eq!(prepaid.payment_amount(), 6.0, epsilon = 1e-9);
    }
}
