//! Annuity schedule of a single fixed-rate loan segment

use std::iter::FusedIterator;

use crate::error::{MortgageError, MortgageResult};
use super::payment::PaymentRecord;

/// Fixed per-period payment of an annuity with payments at period end.
///
/// Amortizes `amount` down to `future_value` over `n_periods` at
/// `periodic_rate`, then adds `fixed_surcharge`. Rates too small to move the
/// growth factor fall back to straight-line repayment.
pub fn annuity_payment(
    amount: f64,
    periodic_rate: f64,
    n_periods: u32,
    future_value: f64,
    fixed_surcharge: f64,
) -> f64 {
    let n = n_periods as f64;

    // (1 + r)^n - 1, without rounding 1 + r first
    let growth_minus_one = (n * periodic_rate.ln_1p()).exp_m1();
    if growth_minus_one == 0.0 {
        return (amount - future_value) / n + fixed_surcharge;
    }

    amount * periodic_rate + (amount - future_value) * periodic_rate / growth_minus_one + fixed_surcharge
}

/// Lazy payment schedule of one fixed-rate, fixed-term loan segment
///
/// Yields `n_periods` regular records followed by one settlement record.
/// The settlement record holds the interest on the remaining balance but
/// carries over the repayment of the last regular period.
#[derive(Debug, Clone)]
pub struct AmortizationGenerator {
    periodic_rate: f64,
    n_periods: u32,
    future_value: f64,
    fixed_surcharge: f64,
    payment_amount: f64,

    /// Balance at the beginning of the next period
    amount_boy: f64,

    /// Number of records yielded so far
    yielded: u32,

    /// Repayment of the most recent regular period
    last_repayment: f64,
}

impl AmortizationGenerator {
    pub fn new(
        start_amount: f64,
        periodic_rate: f64,
        n_periods: u32,
        future_value: f64,
        fixed_surcharge: f64,
    ) -> MortgageResult<Self> {
        if n_periods < 1 {
            return Err(MortgageError::invalid_input(
                "n_periods",
                format!("should be a positive number, {} provided", n_periods),
            ));
        }
        for (field, value) in [
            ("start_amount", start_amount),
            ("periodic_rate", periodic_rate),
            ("future_value", future_value),
            ("fixed_surcharge", fixed_surcharge),
        ] {
            if !value.is_finite() {
                return Err(MortgageError::invalid_input(field, format!("{} is not finite", value)));
            }
        }
        if periodic_rate <= -1.0 {
            return Err(MortgageError::invalid_input(
                "periodic_rate",
                format!("{} would wipe out the balance each period", periodic_rate),
            ));
        }

        Ok(Self {
            periodic_rate,
            n_periods,
            future_value,
            fixed_surcharge,
            payment_amount: annuity_payment(
                start_amount,
                periodic_rate,
                n_periods,
                future_value,
                fixed_surcharge,
            ),
            amount_boy: start_amount,
            yielded: 0,
            last_repayment: 0.0,
        })
    }

    /// Fixed payment per period, surcharge included
    pub fn payment_amount(&self) -> f64 {
        self.payment_amount
    }

    pub fn periodic_rate(&self) -> f64 {
        self.periodic_rate
    }

    pub fn n_periods(&self) -> u32 {
        self.n_periods
    }

    pub fn future_value(&self) -> f64 {
        self.future_value
    }

    /// True once the settlement record has been yielded
    pub fn is_exhausted(&self) -> bool {
        self.yielded > self.n_periods
    }

    fn interest_on(&self, amount: f64) -> f64 {
        amount * self.periodic_rate + self.fixed_surcharge
    }
}

impl Iterator for AmortizationGenerator {
    type Item = PaymentRecord;

    fn next(&mut self) -> Option<PaymentRecord> {
        if self.yielded < self.n_periods {
            let interest = self.interest_on(self.amount_boy);
            let repayment = self.payment_amount - interest;
            let record = PaymentRecord::new(self.amount_boy, interest, repayment);

            self.amount_boy = record.amount_end();
            self.last_repayment = repayment;
            self.yielded += 1;
            Some(record)
        } else if self.yielded == self.n_periods {
            // Settlement snapshot: repayment carried over from the final period
            // TODO: decide whether the settlement repayment should be recomputed from the remaining balance
            let interest = self.interest_on(self.amount_boy);
            self.yielded += 1;
            Some(PaymentRecord::new(self.amount_boy, interest, self.last_repayment))
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.n_periods + 1).saturating_sub(self.yielded) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for AmortizationGenerator {}

impl FusedIterator for AmortizationGenerator {}
