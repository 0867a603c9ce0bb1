//! Error types for the amortization core

use thiserror::Error;

use crate::loan_part::LoanPartId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MortgageError {
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Incompatible payment mapping (missing: {missing:?}, unrecognized: {unrecognized:?})")]
    Shape {
        missing: Vec<String>,
        unrecognized: Vec<String>,
    },

    #[error("Loan part {loan_part} exhausted after {periods} periods")]
    Exhausted { loan_part: LoanPartId, periods: u32 },

    #[error("Loan part {0} not found in mortgage")]
    NotFound(LoanPartId),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

impl MortgageError {
    pub(crate) fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        MortgageError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type MortgageResult<T> = Result<T, MortgageError>;
