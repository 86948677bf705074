use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use budget_tracker::budget::ledger::Ledger;
use budget_tracker::budget::savings::monthly_savings_target;
use budget_tracker::budget::ALERT_THRESHOLD;
use budget_tracker::clock::SystemClock;
use budget_tracker::data::{self, RawEntry};
use budget_tracker::store::{self, LedgerStore, Resource};

#[derive(Parser)]
#[command(name = "budget-tracker", version, about = "Track spending, budgets and savings")]
struct Cli {
    /// Directory holding transactions.json, budgets.json and savings.json
    #[arg(long, env = "BUDGET_TRACKER_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Save over data files that exist but could not be loaded
    #[arg(long)]
    overwrite_damaged: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record a transaction
    Record {
        #[arg(long)]
        amount: String,
        #[arg(long)]
        category: String,
        /// income or expense
        #[arg(long = "type")]
        kind: String,
        /// YYYY-MM-DD, today when omitted
        #[arg(long, default_value = "")]
        date: String,
    },
    /// Set or replace the budget of a category
    SetBudget { category: String, limit: Decimal },
    /// Show categories at or over the alert threshold
    Alerts {
        #[arg(long, default_value_t = ALERT_THRESHOLD)]
        threshold: Decimal,
    },
    /// Spending per category
    Summary,
    /// Spending against every budget
    Utilization,
    /// Compare the totals of two months
    Trend { current: u32, previous: u32 },
    /// Monthly amount needed to reach a goal
    Target { goal: Decimal, months: i64 },
    /// Set the savings goal
    SetGoal { goal: Decimal },
    /// Add to (or, when negative, take from) current savings
    Deposit {
        #[arg(allow_hyphen_values = true)]
        amount: Decimal,
    },
    /// Import transactions from a CSV file with columns amount,category,type,date
    Import { path: PathBuf },
    /// Export transactions as JSON
    Export { path: Option<PathBuf> },
}

impl Command {
    /// The stored resource this command changes, if any.
    fn mutates(&self) -> Option<Resource> {
        match self {
            Command::Record { .. } | Command::Import { .. } => Some(Resource::Transactions),
            Command::SetBudget { .. } => Some(Resource::Budgets),
            Command::SetGoal { .. } | Command::Deposit { .. } => Some(Resource::Savings),
            _ => None,
        }
    }
}

fn print_alerts(ledger: &Ledger, threshold: Decimal) {
    for alert in ledger.alerts(threshold) {
        println!("ALERT: {}", alert);
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let store = LedgerStore::open(&cli.data_dir);
    store.ensure_initialized().context("failed to initialize data directory")?;

    let report = store.load();
    for (resource, reason) in report.initialized_empty() {
        eprintln!("warning: {} initialized empty, {}", resource, reason);
    }

    let damaged = if cli.overwrite_damaged {
        Vec::new()
    } else {
        report.damaged()
    };
    if let Some(resource) = cli.command.mutates().filter(|resource| damaged.contains(resource)) {
        bail!(
            "{} could not be loaded, refusing to overwrite it (pass --overwrite-damaged to start it over)",
            resource
        );
    }
    let mut ledger = report.ledger;

    let changed = match cli.command {
        Command::Record {
            amount,
            category,
            kind,
            date,
        } => {
            let transaction = data::parse_manual_entry(&RawEntry::new(&amount, &category, &kind, &date), &SystemClock)?;
            ledger.record(transaction);
            println!("Transaction recorded.");
            print_alerts(&ledger, ALERT_THRESHOLD);
            true
        },
        Command::SetBudget { category, limit } => {
            ledger.set_budget(&category, limit)?;
            println!("Budget for '{}' set to {:.2}.", category.trim(), limit);
            true
        },
        Command::Alerts { threshold } => {
            print_alerts(&ledger, threshold);
            false
        },
        Command::Summary => {
            let totals = ledger.category_totals();
            println!("Spending summary:");
            for (category, amount) in totals.iter() {
                println!("  - {}: {:.2}", category, amount);
            }
            println!("Total spending: {:.2}", totals.total());
            false
        },
        Command::Utilization => {
            for line in ledger.budget_report() {
                let ratio = line
                    .ratio
                    .map(|ratio| match ratio.checked_mul(Decimal::ONE_HUNDRED) {
                        Some(percent) => format!("{:.0}%", percent),
                        None => format!("{}x", ratio),
                    })
                    .unwrap_or_else(|| "n/a".to_string());
                println!("{}: spent {:.2} of {:.2} ({})", line.category, line.spent, line.limit, ratio);
            }
            false
        },
        Command::Trend { current, previous } => {
            let trend = ledger.monthly_trend(current, previous)?;
            println!(
                "Current month: {:.2}, previous month: {:.2}, change: {:.2}",
                trend.total_a,
                trend.total_b,
                trend.delta()
            );
            false
        },
        Command::Target { goal, months } => {
            let monthly = monthly_savings_target(goal, months)?;
            println!("You need to save {:.2} per month.", monthly);
            false
        },
        Command::SetGoal { goal } => {
            ledger.set_savings_goal(goal)?;
            println!(
                "Savings goal of {:.2} set. You should save {:.2} per month.",
                ledger.savings.goal(),
                ledger.savings.recommended_monthly()
            );
            true
        },
        Command::Deposit { amount } => {
            let goal_reached = ledger.deposit_savings(amount);
            println!("Current savings: {:.2}", ledger.savings.current_savings());
            if goal_reached {
                println!("Congratulations! You've reached your savings goal!");
            }
            true
        },
        Command::Import { path } => {
            let count = data::import_csv(&path, &mut ledger, &SystemClock)?;
            println!("Imported {} transactions from {}.", count, path.display());
            true
        },
        Command::Export { path } => {
            let path = path.unwrap_or_else(|| cli.data_dir.join("transactions_export.json"));
            store::export_transactions(&ledger.transactions, &path)?;
            println!("Transactions exported to {}.", path.display());
            false
        },
    };

    if changed {
        store.save_skipping(&ledger, &damaged)?;
    }

    Ok(())
}
