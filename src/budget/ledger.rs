use std::collections::BTreeMap;

use log::debug;
use rust_decimal::Decimal;

use super::aggregation::{self, BudgetLine, CategoryTotals, MonthlyTrend};
use super::alerts::{self, Alert};
use super::savings::{self, SavingsState};
use super::transaction::Transaction;
use super::{ValidationError, MAX_AMOUNT};

/// Spending limit per category, keyed by category name.
pub type Budgets = BTreeMap<String, Decimal>;

/// Everything that gets persisted: transactions, budgets and savings progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    pub transactions: Vec<Transaction>,
    pub budgets: Budgets,
    pub savings: SavingsState,
}

impl Ledger {
    pub fn new() -> Ledger {
        Ledger::default()
    }

    pub fn record(&mut self, transaction: Transaction) {
        debug!(
            "recording transaction, category={}, kind={}, amount={}",
            transaction.category(),
            transaction.kind(),
            transaction.amount()
        );
        self.transactions.push(transaction);
    }

    pub fn record_all(&mut self, transactions: Vec<Transaction>) -> usize {
        let count = transactions.len();
        self.transactions.extend(transactions);
        count
    }

    /// Creates or overwrites the limit of `category`, returning the previous one.
    pub fn set_budget(&mut self, category: &str, limit: Decimal) -> Result<Option<Decimal>, ValidationError> {
        let category = category.trim();
        if category.is_empty() {
            return Err(ValidationError::MissingField("category"));
        }
        if limit < Decimal::ZERO {
            return Err(ValidationError::Negative("budget limit"));
        }
        if limit > MAX_AMOUNT {
            return Err(ValidationError::AmountTooLarge(limit));
        }

        Ok(self.budgets.insert(category.to_string(), limit))
    }

    pub fn category_totals(&self) -> CategoryTotals {
        aggregation::category_totals(&self.transactions)
    }

    pub fn budget_utilization(&self) -> CategoryTotals {
        aggregation::budget_utilization(&self.transactions, &self.budgets)
    }

    pub fn budget_report(&self) -> Vec<BudgetLine> {
        aggregation::budget_report(&self.transactions, &self.budgets)
    }

    pub fn monthly_trend(&self, month_a: u32, month_b: u32) -> Result<MonthlyTrend, ValidationError> {
        aggregation::monthly_trend(&self.transactions, month_a, month_b)
    }

    pub fn alerts(&self, threshold: Decimal) -> Vec<Alert> {
        alerts::evaluate_alerts(&self.transactions, &self.budgets, threshold)
    }

    pub fn set_savings_goal(&mut self, goal: Decimal) -> Result<(), ValidationError> {
        self.savings = savings::set_goal(&self.savings, goal)?;
        Ok(())
    }

    /// Returns whether the savings goal is met after the deposit.
    pub fn deposit_savings(&mut self, amount: Decimal) -> bool {
        let (updated, goal_reached) = savings::deposit(&self.savings, amount);
        self.savings = updated;
        goal_reached
    }
}
