//! Load loan part terms from CSV
//!
//! Expected columns: `amount,rate,periods` plus the optional columns
//! `future_value,fixed_surcharge,rate_basis,name`. `rate_basis` is either
//! `periodic` (default) or `annual`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use csv::Reader;

use super::terms::LoanPartTerms;

/// Raw CSV row
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    amount: f64,
    rate: f64,
    periods: u32,
    #[serde(default)]
    future_value: Option<f64>,
    #[serde(default)]
    fixed_surcharge: Option<f64>,
    #[serde(default)]
    rate_basis: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl CsvRow {
    fn into_terms(self) -> Result<LoanPartTerms> {
        let rate_is_annual = match self.rate_basis.as_deref().map(str::trim) {
            None | Some("") | Some("periodic") => false,
            Some("annual") => true,
            Some(other) => bail!("Unknown rate_basis: {}", other),
        };

        Ok(LoanPartTerms {
            amount: self.amount,
            rate: self.rate,
            periods: self.periods,
            future_value: self.future_value.unwrap_or(0.0),
            fixed_surcharge: self.fixed_surcharge.unwrap_or(0.0),
            rate_is_annual,
            name: self.name.filter(|n| !n.trim().is_empty()),
        })
    }
}

/// Load loan part terms from a CSV file
pub fn load_loan_parts(path: &Path) -> Result<Vec<LoanPartTerms>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open loan parts file {}", path.display()))?;
    read_loan_parts(file).with_context(|| format!("Failed to read {}", path.display()))
}

/// Read loan part terms from any CSV source
pub fn read_loan_parts<R: Read>(source: R) -> Result<Vec<LoanPartTerms>> {
    let mut reader = Reader::from_reader(source);
    let mut terms = Vec::new();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("Invalid loan part on row {}", line + 1))?;
        terms.push(row.into_terms()?);
    }

    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_loan_parts() {
        let data = "\
amount,rate,periods,future_value,fixed_surcharge,rate_basis,name
92500,0.0215,30,92500,1.7,annual,interest-only
150000,0.0195,30,,1.7,annual,
144000,0.0016,360,,,,
";
        let terms = read_loan_parts(data.as_bytes()).unwrap();

        assert_eq!(terms.len(), 3);
        assert_eq!(terms[0].future_value, 92_500.0);
        assert!(terms[0].rate_is_annual);
        assert_eq!(terms[0].name.as_deref(), Some("interest-only"));
        assert_eq!(terms[1].future_value, 0.0);
        assert_eq!(terms[1].name, None);
        assert!(!terms[2].rate_is_annual);
        assert_eq!(terms[2].periods, 360);
    }

    #[test]
    fn test_minimal_columns() {
        let terms = read_loan_parts("amount,rate,periods\n1000,0.01,12\n".as_bytes()).unwrap();
        assert_eq!(terms, vec![LoanPartTerms::new(1000.0, 0.01, 12)]);
    }

    #[test]
    fn test_unknown_rate_basis() {
        let data = "amount,rate,periods,rate_basis\n1000,0.01,12,weekly\n";
        assert!(read_loan_parts(data.as_bytes()).is_err());
    }
}
