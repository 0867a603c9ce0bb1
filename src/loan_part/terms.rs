//! Declarative terms of a loan part, as read from configuration

use serde::{Deserialize, Serialize};

use crate::error::MortgageResult;
use super::tracker::LoanPartTracker;

/// Terms from which a [`LoanPartTracker`] is built
///
/// With `rate_is_annual` set, `rate` is an annual effective rate and
/// `periods` counts years; both are converted to periods when building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanPartTerms {
    pub amount: f64,
    pub rate: f64,
    pub periods: u32,

    #[serde(default)]
    pub future_value: f64,

    #[serde(default)]
    pub fixed_surcharge: f64,

    #[serde(default)]
    pub rate_is_annual: bool,

    #[serde(default)]
    pub name: Option<String>,
}

impl LoanPartTerms {
    pub fn new(amount: f64, rate: f64, periods: u32) -> Self {
        Self {
            amount,
            rate,
            periods,
            future_value: 0.0,
            fixed_surcharge: 0.0,
            rate_is_annual: false,
            name: None,
        }
    }

    /// Interest-only: the full amount remains outstanding at the end
    pub fn interest_only(amount: f64, rate: f64, periods: u32) -> Self {
        Self::new(amount, rate, periods).with_future_value(amount)
    }

    pub fn with_future_value(mut self, future_value: f64) -> Self {
        self.future_value = future_value;
        self
    }

    pub fn with_fixed_surcharge(mut self, fixed_surcharge: f64) -> Self {
        self.fixed_surcharge = fixed_surcharge;
        self
    }

    /// Interpret `rate` as annual and `periods` as years
    pub fn annual(mut self) -> Self {
        self.rate_is_annual = true;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Build a fresh tracker for these terms
    pub fn build(&self, periods_per_year: u32) -> MortgageResult<LoanPartTracker> {
        let tracker = if self.rate_is_annual {
            LoanPartTracker::from_annual_rate(
                self.amount,
                self.rate,
                self.periods,
                self.future_value,
                self.fixed_surcharge,
                periods_per_year,
            )?
        } else {
            LoanPartTracker::with_options(
                self.amount,
                self.rate,
                self.periods,
                self.future_value,
                self.fixed_surcharge,
            )?
        };

        Ok(match &self.name {
            Some(name) => tracker.with_name(name.clone()),
            None => tracker,
        })
    }
}
