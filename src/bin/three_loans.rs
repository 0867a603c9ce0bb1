//! Three-part mortgage with LTV-based rate discounts, prepayments and a rate shock
//!
//! Usage: cargo run --bin three_loans [house_price]

use anyhow::{Context, Result};

use mortgage_scenarios::reporting::{group_ledger_by_year, Column};
use mortgage_scenarios::{LoanPartTerms, LtvBand, MortgageRunner, Scenario, ScenarioRunner};

const START_MONTH: &str = "2020-10";
const YEARS: u32 = 30;
const FIXED_SURCHARGE: f64 = 1.7;

fn main() -> Result<()> {
    env_logger::init();

    let house_price: f64 = match std::env::args().nth(1) {
        Some(arg) => arg.parse().with_context(|| format!("Invalid house price '{}'", arg))?,
        None => 420_000.0,
    };

    let terms = vec![
        LoanPartTerms::interest_only(92_500.0, 0.0215, YEARS)
            .with_fixed_surcharge(FIXED_SURCHARGE)
            .annual()
            .named("interest-only"),
        LoanPartTerms::new(150_000.0, 0.0195, YEARS)
            .with_fixed_surcharge(FIXED_SURCHARGE)
            .annual()
            .named("annuity-1"),
        LoanPartTerms::new(144_000.0, 0.0195, YEARS)
            .with_fixed_surcharge(FIXED_SURCHARGE)
            .annual()
            .named("annuity-2"),
    ];
    let base = MortgageRunner::from_terms(&terms, 12)?;

    println!("Three-part mortgage of {:.2} on a house of {:.2}", base.current_amount(), house_price);

    let mut discount = Scenario::new("ltv discount");
    discount.rates_are_annual = true;
    let discount = discount
        .with_ltv_rates(LtvBand::Low, vec![Some(0.019), Some(0.0175), Some(0.0175)])
        .with_ltv_rates(LtvBand::Medium, vec![Some(0.0205), Some(0.0185), Some(0.0185)]);

    let prepaying = Scenario {
        name: "ltv discount + prepayments".to_string(),
        ..discount.clone()
    }
    .with_prepayment(120, 0, 20_000.0)
    .with_prepayment(240, 0, 20_000.0);

    let mut shock = Scenario::new("5% after 20 years").with_rate_change(240, 0.05);
    shock.rates_are_annual = true;

    let scenarios = vec![Scenario::new("base"), discount, prepaying, shock];
    let runner = ScenarioRunner::new(base, Some(house_price))?;

    for result in runner.run_scenarios(&scenarios) {
        let result = result?;
        let summary = result.summary();

        println!("\n{}", "=".repeat(60));
        println!("{}", result.name);
        println!("{}", "=".repeat(60));
        for period in &result.events {
            println!("  period {:>4}: {}", period.period, period.events.join("; "));
        }

        let years = group_ledger_by_year(result.mortgage.ledger(), START_MONTH, &["amount", "interest", "repayment"])?;
        println!("\n  {:>6} {:>14} {:>12} {:>12}", "Year", "Amount", "Interest", "Repayment");
        for year in years.iter().take(5) {
            println!("  {:>6} {:>14.2} {:>12.2} {:>12.2}",
                year.year,
                year.get(Column::AmountBoy).unwrap_or(0.0),
                year.get(Column::Interest).unwrap_or(0.0),
                year.get(Column::Repayment).unwrap_or(0.0),
            );
        }

        println!("\n  Total Interest: {:.2}", summary.total_interest);
        println!("  Total Payment: {:.2}", summary.total_payment);
        println!("  Final Amount: {:.2}", summary.final_amount);
    }

    Ok(())
}
