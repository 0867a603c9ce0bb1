//! JSON configuration of a mortgage and its scenarios

use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::amortization::MONTHS_PER_YEAR;
use crate::error::MortgageResult;
use crate::loan_part::LoanPartTerms;
use crate::mortgage::MortgageRunner;
use crate::scenario::{Scenario, ScenarioRunner};

fn default_periods_per_year() -> u32 {
    MONTHS_PER_YEAR
}

/// Mortgage definition as read from a JSON file
///
/// ```json
/// {
///   "start_month": "2020-10",
///   "house_price": 631000,
///   "loan_parts": [
///     {"amount": 92500, "rate": 0.0215, "periods": 30, "future_value": 92500, "rate_is_annual": true}
///   ],
///   "scenarios": [
///     {"name": "base"},
///     {"name": "rate shock", "rates_are_annual": true,
///      "rate_changes": [{"period": 240, "rate": 0.05}]}
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgageConfig {
    pub loan_parts: Vec<LoanPartTerms>,

    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: u32,

    /// Calendar month of the first period, `YYYY-MM`
    #[serde(default)]
    pub start_month: Option<String>,

    #[serde(default)]
    pub house_price: Option<f64>,

    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

impl MortgageConfig {
    pub fn new(loan_parts: Vec<LoanPartTerms>) -> Self {
        Self {
            loan_parts,
            periods_per_year: MONTHS_PER_YEAR,
            start_month: None,
            house_price: None,
            scenarios: Vec::new(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_json_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: MortgageConfig = serde_json::from_str(text)?;
        ensure!(config.periods_per_year >= 1, "periods_per_year must be at least 1");
        ensure!(!config.loan_parts.is_empty(), "at least one loan part is required");
        Ok(config)
    }

    /// Fresh mortgage with every configured loan part
    pub fn build_mortgage(&self) -> MortgageResult<MortgageRunner> {
        MortgageRunner::from_terms(&self.loan_parts, self.periods_per_year)
    }

    pub fn scenario_runner(&self) -> MortgageResult<ScenarioRunner> {
        Ok(ScenarioRunner::new(self.build_mortgage()?, self.house_price)?
            .with_periods_per_year(self.periods_per_year))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_LOANS: &str = r#"{
        "start_month": "2020-10",
        "house_price": 631000,
        "loan_parts": [
            {"amount": 92500, "rate": 0.0215, "periods": 30, "future_value": 92500, "rate_is_annual": true},
            {"amount": 198183, "rate": 0.0195, "periods": 30, "rate_is_annual": true},
            {"amount": 144000, "rate": 0.0195, "periods": 30, "rate_is_annual": true, "name": "annuity"}
        ],
        "scenarios": [
            {"name": "base"},
            {"name": "discount", "rates_are_annual": true,
             "ltv_rates": [{"band": "low", "rates": [0.019, 0.0175, 0.0175]}]},
            {"name": "rate shock", "rates_are_annual": true,
             "rate_changes": [{"period": 240, "rate": 0.05}]}
        ]
    }"#;

    #[test]
    fn test_parse_config() {
        let config = MortgageConfig::from_json_str(THREE_LOANS).unwrap();

        assert_eq!(config.periods_per_year, 12);
        assert_eq!(config.loan_parts.len(), 3);
        assert_eq!(config.start_month.as_deref(), Some("2020-10"));
        assert_eq!(config.house_price, Some(631_000.0));
        assert_eq!(config.scenarios.len(), 3);
        assert_eq!(config.scenarios[2].rate_changes[0].period, 240);
    }

    #[test]
    fn test_build_mortgage() {
        let config = MortgageConfig::from_json_str(THREE_LOANS).unwrap();
        let mut mortgage = config.build_mortgage().unwrap();

        assert_eq!(mortgage.periods_remaining(), 360);
        assert_eq!(mortgage.loan_parts()[2].name(), Some("annuity"));
        assert_eq!(mortgage.step_all().unwrap(), 360);
    }

    #[test]
    fn test_scenario_runner_from_config() {
        let config = MortgageConfig::from_json_str(THREE_LOANS).unwrap();
        let runner = config.scenario_runner().unwrap();

        let results = runner.run_scenarios(&config.scenarios);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.is_ok()));
    }

    #[test]
    fn test_rejects_empty_mortgage() {
        assert!(MortgageConfig::from_json_str(r#"{"loan_parts": []}"#).is_err());
        assert!(MortgageConfig::from_json_str(r#"{"loan_parts": [{"amount": 1}]}"#).is_err());
    }
}
