//! Mortgage Scenarios - amortization schedules for multi-tranche mortgages
//!
//! This library provides:
//! - Annuity, interest-only and surcharge-bearing payment schedules per loan part
//! - Loan part tracking with mid-life rate changes and prepayments
//! - A mortgage runner that steps all loan parts in lockstep into one ledger
//! - Year grouping of the ledger for reporting
//! - What-if scenarios (LTV-based repricing, prepayments) run in parallel

pub mod error;
pub mod amortization;
pub mod loan_part;
pub mod mortgage;
pub mod reporting;
pub mod scenario;
pub mod config;

// Re-export commonly used types
pub use error::{MortgageError, MortgageResult};
pub use amortization::{AmortizationGenerator, PaymentRecord};
pub use loan_part::{LoanPartId, LoanPartPayment, LoanPartTerms, LoanPartTracker};
pub use mortgage::{Ledger, LedgerRow, MortgageRunner, StepOutcome};
pub use scenario::{LtvBand, Scenario, ScenarioRunner};
pub use config::MortgageConfig;
