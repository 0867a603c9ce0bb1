//! Scenario runner for what-if mortgage projections
//!
//! Holds a mortgage that has not started paying yet, then runs any number of
//! scenarios against independent copies of it. A scenario can reprice loan
//! parts when the loan-to-value band changes, schedule rate changes and
//! schedule prepayments.

use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::amortization::{periodic_rate, MONTHS_PER_YEAR};
use crate::error::{MortgageError, MortgageResult};
use crate::mortgage::{LedgerSummary, MortgageRunner, StepOutcome};

/// Upper bounds of the loan-to-value bands (exclusive)
pub const LTV_BOUNDARIES: [f64; 3] = [0.675, 0.9, 1.0];

/// Loan-to-value band that typically determines the rate discount
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LtvBand {
    /// Below 67.5%
    Low,
    /// 67.5% up to 90%
    Medium,
    /// 90% up to 100%
    High,
    /// 100% and above
    Underwater,
}

impl LtvBand {
    pub fn classify(ltv: f64) -> Self {
        match LTV_BOUNDARIES.iter().filter(|&&bound| ltv >= bound).count() {
            0 => LtvBand::Low,
            1 => LtvBand::Medium,
            2 => LtvBand::High,
            _ => LtvBand::Underwater,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LtvBand::Low => "<67.5%",
            LtvBand::Medium => "67.5% - 90%",
            LtvBand::High => "90% - 100%",
            LtvBand::Underwater => ">100%",
        }
    }
}

/// Rates applied to the loan parts, by position, once the mortgage enters `band`.
/// `None` keeps the current rate of that loan part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LtvRates {
    pub band: LtvBand,
    pub rates: Vec<Option<f64>>,
}

/// Extra repayment on one loan part, made right after `period` steps.
/// Period 0 is before the first payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prepayment {
    pub period: u32,
    pub loan_part: usize,
    pub amount: f64,
}

/// New rate for one loan part, or for all of them when `loan_part` is `None`,
/// applied right after `period` steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateChange {
    pub period: u32,
    #[serde(default)]
    pub loan_part: Option<usize>,
    pub rate: f64,
}

/// A set of events applied while running a mortgage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,

    #[serde(default)]
    pub ltv_rates: Vec<LtvRates>,

    #[serde(default)]
    pub rate_changes: Vec<RateChange>,

    #[serde(default)]
    pub prepayments: Vec<Prepayment>,

    /// Interpret `ltv_rates` and `rate_changes` as annual rates
    #[serde(default)]
    pub rates_are_annual: bool,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_ltv_rates(mut self, band: LtvBand, rates: Vec<Option<f64>>) -> Self {
        self.ltv_rates.push(LtvRates { band, rates });
        self
    }

    /// Reprice every loan part at `period`
    pub fn with_rate_change(mut self, period: u32, rate: f64) -> Self {
        self.rate_changes.push(RateChange {
            period,
            loan_part: None,
            rate,
        });
        self
    }

    pub fn with_loan_part_rate_change(mut self, period: u32, loan_part: usize, rate: f64) -> Self {
        self.rate_changes.push(RateChange {
            period,
            loan_part: Some(loan_part),
            rate,
        });
        self
    }

    pub fn with_prepayment(mut self, period: u32, loan_part: usize, amount: f64) -> Self {
        self.prepayments.push(Prepayment {
            period,
            loan_part,
            amount,
        });
        self
    }

    fn rates_for(&self, band: LtvBand) -> Option<&LtvRates> {
        self.ltv_rates.iter().find(|r| r.band == band)
    }

    /// Scheduled events must happen before the final payment
    fn check_schedule(&self, term: u32) -> MortgageResult<()> {
        let periods = self
            .rate_changes
            .iter()
            .map(|c| ("rate_change", c.period))
            .chain(self.prepayments.iter().map(|p| ("prepayment", p.period)));

        for (field, period) in periods {
            if period >= term {
                return Err(MortgageError::invalid_input(
                    field,
                    format!(
                        "scenario '{}' schedules period {} but the mortgage ends after {} periods",
                        self.name, period, term
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Events that happened after a given step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodEvents {
    pub period: u32,
    pub events: Vec<String>,
}

/// Outcome of one scenario: the fully run mortgage plus its event log
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub name: String,
    pub mortgage: MortgageRunner,
    pub events: Vec<PeriodEvents>,
}

impl ScenarioResult {
    pub fn summary(&self) -> LedgerSummary {
        self.mortgage.ledger().summary()
    }
}

/// Pre-loaded scenario runner for batch what-if projections
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::new(mortgage, Some(631_000.0))?;
///
/// let results = runner.run_scenarios(&[
///     Scenario::new("base"),
///     Scenario::new("prepay").with_prepayment(12, 1, 10_000.0),
/// ]);
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    /// Mortgage every scenario starts from
    base: MortgageRunner,
    house_price: Option<f64>,
    periods_per_year: u32,
}

impl ScenarioRunner {
    /// Create runner from a mortgage that has not been stepped yet
    pub fn new(base: MortgageRunner, house_price: Option<f64>) -> MortgageResult<Self> {
        if base.has_started() {
            return Err(MortgageError::invalid_input(
                "mortgage",
                format!("already ran {} periods, scenarios need a fresh mortgage", base.period()),
            ));
        }
        if let Some(price) = house_price {
            if !(price.is_finite() && price > 0.0) {
                return Err(MortgageError::invalid_input(
                    "house_price",
                    format!("{} is not a positive amount", price),
                ));
            }
        }

        Ok(Self {
            base,
            house_price,
            periods_per_year: MONTHS_PER_YEAR,
        })
    }

    /// Periods per year used to convert annual scenario rates
    pub fn with_periods_per_year(mut self, periods_per_year: u32) -> Self {
        self.periods_per_year = periods_per_year;
        self
    }

    pub fn base(&self) -> &MortgageRunner {
        &self.base
    }

    pub fn house_price(&self) -> Option<f64> {
        self.house_price
    }

    /// Loan-to-value of a mortgage against the house price
    pub fn ltv(&self, mortgage: &MortgageRunner) -> Option<f64> {
        self.house_price.map(|price| mortgage.current_amount() / price)
    }

    /// Run one scenario on a copy of the base mortgage
    pub fn run(&self, scenario: &Scenario) -> MortgageResult<ScenarioResult> {
        scenario.check_schedule(self.base.periods_remaining())?;

        let mut mortgage = self.base.clone();
        let mut band = self.ltv(&mortgage).map(LtvBand::classify);
        let mut log = Vec::new();

        let mut events = Vec::new();
        self.apply_scheduled(&mut mortgage, scenario, &mut events)?;
        if !events.is_empty() {
            info!("Scenario '{}' period 0: {}", scenario.name, events.join("; "));
            log.push(PeriodEvents { period: 0, events });
        }

        loop {
            if let StepOutcome::Exhausted = mortgage.step()? {
                break;
            }
            let mut events = Vec::new();

            if let Some(ltv) = self.ltv(&mortgage) {
                let new_band = LtvBand::classify(ltv);
                if band != Some(new_band) {
                    events.push(format!("ltv {}", new_band.label()));
                    if let Some(rates) = scenario.rates_for(new_band) {
                        self.apply_rates(&mut mortgage, rates, scenario.rates_are_annual)?;
                    }
                    band = Some(new_band);
                }
            }

            self.apply_scheduled(&mut mortgage, scenario, &mut events)?;

            let period = mortgage.period();
            if !events.is_empty() {
                info!("Scenario '{}' period {}: {}", scenario.name, period, events.join("; "));
                log.push(PeriodEvents { period, events });
            }
        }

        let result = ScenarioResult {
            name: scenario.name.clone(),
            mortgage,
            events: log,
        };
        let summary = result.summary();
        info!(
            "Scenario '{}' finished after {} periods: total payment {:.2}, interest {:.2}",
            result.name, summary.total_periods, summary.total_payment, summary.total_interest
        );

        Ok(result)
    }

    /// Run multiple scenarios in parallel, results in input order
    pub fn run_scenarios(&self, scenarios: &[Scenario]) -> Vec<MortgageResult<ScenarioResult>> {
        scenarios.par_iter().map(|scenario| self.run(scenario)).collect()
    }

    /// Rate changes and prepayments scheduled for the current period
    fn apply_scheduled(
        &self,
        mortgage: &mut MortgageRunner,
        scenario: &Scenario,
        events: &mut Vec<String>,
    ) -> MortgageResult<()> {
        let period = mortgage.period();

        for change in scenario.rate_changes.iter().filter(|c| c.period == period) {
            let indices: Vec<usize> = match change.loan_part {
                Some(index) => vec![index],
                None => (0..mortgage.loan_parts().len()).collect(),
            };
            let mut repriced = 0;
            for index in indices {
                if self.apply_rate(mortgage, index, change.rate, scenario.rates_are_annual)? {
                    repriced += 1;
                }
            }
            if repriced > 0 {
                match change.loan_part {
                    Some(index) => events.push(format!("rate {} on loan part {}", change.rate, index)),
                    None => events.push(format!("rate {} on all loan parts", change.rate)),
                }
            }
        }

        for prepayment in scenario.prepayments.iter().filter(|p| p.period == period) {
            if self.apply_prepayment(mortgage, prepayment)? {
                events.push(format!("prepayment {:.2} on loan part {}", prepayment.amount, prepayment.loan_part));
            }
        }
        Ok(())
    }

    fn apply_rates(&self, mortgage: &mut MortgageRunner, rates: &LtvRates, annual: bool) -> MortgageResult<()> {
        for (index, rate) in rates.rates.iter().enumerate() {
            if let Some(rate) = rate {
                self.apply_rate(mortgage, index, *rate, annual)?;
            }
        }
        Ok(())
    }

    /// Returns whether the loan part was repriced
    fn apply_rate(&self, mortgage: &mut MortgageRunner, index: usize, rate: f64, annual: bool) -> MortgageResult<bool> {
        let Some(loan_part) = mortgage.loan_parts().get(index) else {
            warn!("Rate for unknown loan part {} ignored", index);
            return Ok(false);
        };
        if loan_part.remaining_periods() == 0 {
            return Ok(false);
        }

        let rate = if annual {
            periodic_rate(rate, self.periods_per_year)
        } else {
            rate
        };
        let repriced = loan_part.clone_with_rate(rate)?;
        mortgage.replace_loan_part_by_index(index, repriced)?;
        Ok(true)
    }

    /// Returns whether the prepayment was applied
    fn apply_prepayment(&self, mortgage: &mut MortgageRunner, prepayment: &Prepayment) -> MortgageResult<bool> {
        let Some(loan_part) = mortgage.loan_parts().get(prepayment.loan_part) else {
            warn!("Prepayment on unknown loan part {} ignored", prepayment.loan_part);
            return Ok(false);
        };
        if loan_part.remaining_periods() == 0 {
            warn!("Prepayment on paid off loan part {} ignored", prepayment.loan_part);
            return Ok(false);
        }

        let prepaid = loan_part.clone_with_prepayment(prepayment.amount)?;
        mortgage.replace_loan_part_by_index(prepayment.loan_part, prepaid)?;
        Ok(true)
    }
}
