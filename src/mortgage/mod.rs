//! Multi-loan mortgage runner and its payment ledger

mod runner;
mod ledger;

pub use runner::{MortgageRunner, StepOutcome};
pub use ledger::{Ledger, LedgerEntry, LedgerRow, LedgerSummary};
