use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;

use super::ledger::Budgets;
use super::transaction::Transaction;
use super::{ValidationError, PRECISION};

/// Expense totals per category, iterated in the order each category was first seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTotals {
    entries: Vec<(String, Decimal)>,
    index: HashMap<String, usize>,
}

impl CategoryTotals {
    pub fn new() -> CategoryTotals {
        CategoryTotals::default()
    }

    fn add(&mut self, category: &str, amount: Decimal) {
        match self.index.get(category) {
            Some(&position) => {
                let total = &mut self.entries[position].1;
                *total = total.saturating_add(amount);
            },
            None => {
                self.index.insert(category.to_string(), self.entries.len());
                self.entries.push((category.to_string(), amount));
            },
        }
    }

    pub fn get(&self, category: &str) -> Option<Decimal> {
        self.index.get(category).map(|&position| self.entries[position].1)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.index.contains_key(category)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.entries.iter().map(|(category, amount)| (category.as_str(), *amount))
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(category, _)| category.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum across all categories, saturating at `Decimal::MAX`.
    pub fn total(&self) -> Decimal {
        self.entries
            .iter()
            .fold(Decimal::ZERO, |total, (_, amount)| total.saturating_add(*amount))
    }

    /// Order-independent view, handy for comparisons.
    pub fn sorted(&self) -> BTreeMap<&str, Decimal> {
        self.iter().collect()
    }
}

/// Income and expense totals for two calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyTrend {
    pub month_a: u32,
    pub total_a: Decimal,
    pub month_b: u32,
    pub total_b: Decimal,
}

impl MonthlyTrend {
    pub fn total_for(&self, month: u32) -> Option<Decimal> {
        if month == self.month_a {
            Some(self.total_a)
        } else if month == self.month_b {
            Some(self.total_b)
        } else {
            None
        }
    }

    /// `total_a - total_b`.
    pub fn delta(&self) -> Decimal {
        self.total_a.saturating_sub(self.total_b)
    }
}

/// Spending against one configured budget.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetLine {
    pub category: String,
    pub spent: Decimal,
    pub limit: Decimal,
    /// `None` when the limit is zero.
    pub ratio: Option<Decimal>,
}

fn sum_expenses<F>(transactions: &[Transaction], include: F) -> CategoryTotals
where
    F: Fn(&Transaction) -> bool,
{
    transactions
        .iter()
        .filter(|transaction| transaction.kind().is_expense() && include(*transaction))
        .fold(CategoryTotals::new(), |mut totals, transaction| {
            totals.add(transaction.category(), transaction.amount());
            totals
        })
}

pub fn category_totals(transactions: &[Transaction]) -> CategoryTotals {
    sum_expenses(transactions, |_| true)
}

/// Expense totals restricted to categories that have a budget.
pub fn budget_utilization(transactions: &[Transaction], budgets: &Budgets) -> CategoryTotals {
    sum_expenses(transactions, |transaction| budgets.contains_key(transaction.category()))
}

/// Sums every transaction, income included, dated in `month_a` and `month_b`.
///
/// Every date in the ledger is checked, a single malformed one fails the whole call.
pub fn monthly_trend(
    transactions: &[Transaction],
    month_a: u32,
    month_b: u32,
) -> Result<MonthlyTrend, ValidationError> {
    for month in [month_a, month_b] {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::MonthOutOfRange(month));
        }
    }

    let mut trend = MonthlyTrend {
        month_a,
        total_a: Decimal::ZERO,
        month_b,
        total_b: Decimal::ZERO,
    };

    for transaction in transactions {
        let month = transaction.month()?;
        if month == month_a {
            trend.total_a = trend.total_a.saturating_add(transaction.amount());
        }
        if month == month_b {
            trend.total_b = trend.total_b.saturating_add(transaction.amount());
        }
    }

    Ok(trend)
}

/// `spent / limit` for a positive limit, `Decimal::MAX` when the quotient overflows.
pub(crate) fn utilization_ratio(spent: Decimal, limit: Decimal) -> Decimal {
    spent.checked_div(limit).unwrap_or(Decimal::MAX)
}

/// One line per budget, including budgets nothing has been spent against yet.
pub fn budget_report(transactions: &[Transaction], budgets: &Budgets) -> Vec<BudgetLine> {
    let utilization = budget_utilization(transactions, budgets);

    budgets
        .iter()
        .map(|(category, &limit)| {
            let spent = utilization.get(category).unwrap_or(Decimal::ZERO);
            let ratio = if limit > Decimal::ZERO {
                Some(utilization_ratio(spent, limit).round_dp(PRECISION))
            } else {
                None
            };

            BudgetLine {
                category: category.clone(),
                spent,
                limit,
                ratio,
            }
        })
        .collect()
}
