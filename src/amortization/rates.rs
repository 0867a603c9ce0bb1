//! Conversion between annual and periodic interest rates

/// Payment periods in a year for monthly schedules
pub const MONTHS_PER_YEAR: u32 = 12;

/// Periodic rate equivalent to an annual effective rate.
///
/// Uses the root of the annual growth factor: `(1 + annual)^(1/n) - 1`.
pub fn periodic_rate(annual_rate: f64, periods_per_year: u32) -> f64 {
    (1.0 + annual_rate).powf(1.0 / periods_per_year as f64) - 1.0
}

/// Annual effective rate of a periodic rate compounded `periods_per_year` times
pub fn annual_rate(periodic_rate: f64, periods_per_year: u32) -> f64 {
    (1.0 + periodic_rate).powi(periods_per_year as i32) - 1.0
}
