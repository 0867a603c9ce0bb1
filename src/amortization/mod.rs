//! Amortization primitives: payment records, annuity schedules and rate conversion

mod payment;
mod generator;
pub mod rates;

pub use payment::{PaymentRecord, BASE_FIELDS, DERIVED_FIELDS};
pub use generator::{AmortizationGenerator, annuity_payment};
pub use rates::{periodic_rate, annual_rate, MONTHS_PER_YEAR};
