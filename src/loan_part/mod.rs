//! Loan parts (tranches) of a mortgage

mod tracker;
mod terms;
pub mod loader;

pub use tracker::{LoanPartTracker, LoanPartId, LoanPartPayment};
pub use terms::LoanPartTerms;
pub use loader::load_loan_parts;
