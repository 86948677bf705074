use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::aggregation::{budget_utilization, utilization_ratio};
use super::ledger::Budgets;
use super::transaction::Transaction;
use super::{ALERT_THRESHOLD, PRECISION};

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub category: String,
    pub spent: Decimal,
    pub limit: Decimal,
    pub ratio: Decimal,
}

impl Alert {
    /// Utilization as a whole percentage, `None` when the ratio is too large to scale.
    pub fn percent(&self) -> Option<Decimal> {
        self.ratio.checked_mul(dec!(100)).map(|percent| percent.round())
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.percent() {
            Some(percent) => write!(f, "'{}' is at {}% of the budget!", self.category, percent)?,
            None => write!(f, "'{}' is at {} times the budget!", self.category, self.ratio)?,
        }
        write!(f, " Spent: {}, Limit: {}", self.spent, self.limit)
    }
}

/// Alerts for every budgeted category whose spending reached `threshold` of its limit.
///
/// Zero limits never alert, a ratio too large to represent always does.
/// Alerts follow the order in which categories first appear among the expenses.
pub fn evaluate_alerts(transactions: &[Transaction], budgets: &Budgets, threshold: Decimal) -> Vec<Alert> {
    let utilization = budget_utilization(transactions, budgets);

    let mut alerts = Vec::new();
    for (category, spent) in utilization.iter() {
        let Some(&limit) = budgets.get(category) else {
            continue;
        };
        if limit <= Decimal::ZERO {
            continue;
        }
        let ratio = utilization_ratio(spent, limit);

        if ratio >= threshold {
            alerts.push(Alert {
                category: category.to_string(),
                spent,
                limit,
                ratio: ratio.round_dp(PRECISION),
            });
        }
    }

    alerts
}

pub fn evaluate_default_alerts(transactions: &[Transaction], budgets: &Budgets) -> Vec<Alert> {
    evaluate_alerts(transactions, budgets, ALERT_THRESHOLD)
}
