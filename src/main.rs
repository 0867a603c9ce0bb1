//! Mortgage Scenarios CLI
//!
//! Command-line interface for printing mortgage schedules and running scenarios

use std::fs::File;
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use mortgage_scenarios::loan_part::load_loan_parts;
use mortgage_scenarios::reporting::{group_ledger_by_year, Column};
use mortgage_scenarios::{LoanPartTerms, MortgageConfig};

#[derive(Parser)]
#[command(
    name = "mortgage-scenarios",
    version,
    about = "Amortization schedules and what-if scenarios for multi-tranche mortgages"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the payment schedule of a mortgage
    Schedule(ScheduleArgs),
    /// Run every scenario of a mortgage configuration
    Scenarios(ScenarioArgs),
}

#[derive(Args)]
struct ScheduleArgs {
    /// JSON mortgage configuration
    #[arg(long, conflicts_with_all = ["loan_parts", "amount"])]
    config: Option<PathBuf>,

    /// CSV file with loan parts
    #[arg(long, conflicts_with = "amount")]
    loan_parts: Option<PathBuf>,

    /// Amount of a single loan part
    #[arg(long)]
    amount: Option<f64>,

    /// Interest rate per period (per year with --annual)
    #[arg(long, default_value_t = 0.0)]
    rate: f64,

    /// Number of periods (years with --annual)
    #[arg(long, default_value_t = 1)]
    periods: u32,

    /// Balance left after the last period
    #[arg(long, default_value_t = 0.0)]
    future_value: f64,

    /// Fixed amount paid on top of interest each period
    #[arg(long, default_value_t = 0.0)]
    fixed_surcharge: f64,

    /// Treat --rate as annual and --periods as years
    #[arg(long)]
    annual: bool,

    /// Group the schedule by calendar year, starting at this month (YYYY-MM)
    #[arg(long)]
    yearly_from: Option<String>,

    /// Write the full ledger to this CSV file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of periods to print
    #[arg(long, default_value_t = 24)]
    rows: usize,
}

#[derive(Args)]
struct ScenarioArgs {
    /// JSON mortgage configuration with scenarios
    #[arg(long)]
    config: PathBuf,

    /// Print the event log of each scenario
    #[arg(long)]
    events: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Schedule(args) => run_schedule(args),
        Commands::Scenarios(args) => run_scenarios(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn load_config(args: &ScheduleArgs) -> Result<MortgageConfig> {
    if let Some(path) = &args.config {
        return MortgageConfig::from_json_path(path);
    }
    if let Some(path) = &args.loan_parts {
        return Ok(MortgageConfig::new(load_loan_parts(path)?));
    }
    let Some(amount) = args.amount else {
        bail!("one of --config, --loan-parts or --amount is required");
    };

    let mut terms = LoanPartTerms::new(amount, args.rate, args.periods)
        .with_future_value(args.future_value)
        .with_fixed_surcharge(args.fixed_surcharge);
    if args.annual {
        terms = terms.annual();
    }
    Ok(MortgageConfig::new(vec![terms]))
}

fn run_schedule(args: ScheduleArgs) -> Result<()> {
    let config = load_config(&args)?;
    let mut mortgage = config.build_mortgage()?;

    println!("Mortgage with {} loan part(s), {:.2} outstanding", mortgage.loan_parts().len(), mortgage.current_amount());
    for (index, part) in mortgage.loan_parts().iter().enumerate() {
        println!(
            "  [{}] {:<16} amount {:>12.2}  rate {:.6}  periods {:>4}  payment {:>10.2}",
            index,
            part.name().unwrap_or("-"),
            part.start_amount(),
            part.rate(),
            part.n_periods(),
            part.payment_amount(),
        );
    }
    println!();

    mortgage.step_all()?;
    let ledger = mortgage.ledger();

    println!("{:>6} {:>14} {:>12} {:>12} {:>12} {:>14}",
        "Period", "Amount", "Payment", "Interest", "Repayment", "Amount end");
    println!("{}", "-".repeat(76));
    for row in ledger.rows().iter().take(args.rows) {
        println!("{:>6} {:>14.2} {:>12.2} {:>12.2} {:>12.2} {:>14.2}",
            row.period, row.amount_boy, row.payment, row.interest, row.repayment, row.amount_end);
    }
    if ledger.len() > args.rows {
        println!("... ({} more periods)", ledger.len() - args.rows);
    }

    if let Some(start) = args.yearly_from.as_deref().or(config.start_month.as_deref()) {
        let years = group_ledger_by_year(ledger, start, &[])?;
        println!("\nPer calendar year (from {}):", start);
        println!("{:>6} {:>14} {:>12} {:>12} {:>12} {:>14}",
            "Year", "Amount", "Payment", "Interest", "Repayment", "Amount end");
        for year in &years {
            let value = |column| year.get(column).unwrap_or(0.0);
            println!("{:>6} {:>14.2} {:>12.2} {:>12.2} {:>12.2} {:>14.2}",
                year.year,
                value(Column::AmountBoy),
                value(Column::Payment),
                value(Column::Interest),
                value(Column::Repayment),
                value(Column::AmountEnd),
            );
        }
    }

    if let Some(path) = &args.output {
        let file = File::create(path).with_context(|| format!("Unable to create {}", path.display()))?;
        ledger.write_csv(file)?;
        println!("\nFull ledger written to: {}", path.display());
    }

    let summary = ledger.summary();
    println!("\nSummary:");
    println!("  Periods: {}", summary.total_periods);
    println!("  Total Payment: {:.2}", summary.total_payment);
    println!("  Total Interest: {:.2}", summary.total_interest);
    println!("  Total Repayment: {:.2}", summary.total_repayment);
    println!("  Final Amount: {:.2}", summary.final_amount);

    Ok(())
}

fn run_scenarios(args: ScenarioArgs) -> Result<()> {
    let config = MortgageConfig::from_json_path(&args.config)?;
    if config.scenarios.is_empty() {
        bail!("{} defines no scenarios", args.config.display());
    }

    let runner = config.scenario_runner()?;
    let results = runner.run_scenarios(&config.scenarios);

    println!("{:<24} {:>8} {:>14} {:>14} {:>14} {:>8}",
        "Scenario", "Periods", "Payment", "Interest", "Final amount", "Events");
    println!("{}", "-".repeat(87));

    for (scenario, result) in config.scenarios.iter().zip(results) {
        let result = result.with_context(|| format!("Scenario '{}' failed", scenario.name))?;
        let summary = result.summary();
        println!("{:<24} {:>8} {:>14.2} {:>14.2} {:>14.2} {:>8}",
            result.name,
            summary.total_periods,
            summary.total_payment,
            summary.total_interest,
            summary.final_amount,
            result.events.len(),
        );

        if args.events {
            for period in &result.events {
                println!("    period {:>4}: {}", period.period, period.events.join("; "));
            }
        }
    }

    Ok(())
}
