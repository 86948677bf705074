use getset::CopyGetters;
use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{ArithmeticError, ValidationError, MAX_AMOUNT, PRECISION};

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Savings goal and progress.
///
/// `recommended_monthly` is the goal spread over a year, captured when the goal
/// was last set. Nothing else recomputes it.
#[derive(Debug, Clone, Default, PartialEq, CopyGetters, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsState {
    #[getset(get_copy = "pub")]
    #[serde(default)]
    goal: Decimal,
    #[getset(get_copy = "pub")]
    #[serde(default, alias = "recommended_monthly")]
    recommended_monthly: Decimal,
    #[getset(get_copy = "pub")]
    #[serde(default, alias = "current_savings")]
    current_savings: Decimal,
}

impl SavingsState {
    /// What is still missing to reach the goal, never below zero.
    pub fn remaining(&self) -> Decimal {
        self.goal.saturating_sub(self.current_savings).max(Decimal::ZERO)
    }
}

/// Amount to put aside every month to reach `goal` in `months` months.
pub fn monthly_savings_target(goal: Decimal, months: i64) -> Result<Decimal, ArithmeticError> {
    if months <= 0 {
        return Err(ArithmeticError::NonPositiveMonths(months));
    }

    Ok((goal / Decimal::from(months)).round_dp(PRECISION))
}

/// Returns the state with a new goal and a fresh monthly recommendation.
pub fn set_goal(state: &SavingsState, goal: Decimal) -> Result<SavingsState, ValidationError> {
    if goal < Decimal::ZERO {
        return Err(ValidationError::Negative("savings goal"));
    }
    if goal > MAX_AMOUNT {
        return Err(ValidationError::AmountTooLarge(goal));
    }

    let recommended_monthly = (goal / MONTHS_PER_YEAR).round_dp(PRECISION);
    debug!("savings goal set, goal={}, monthly={}", goal, recommended_monthly);

    Ok(SavingsState {
        goal,
        recommended_monthly,
        current_savings: state.current_savings,
    })
}

/// Adds a signed amount to the current savings, saturating at the `Decimal` bounds.
///
/// The flag reports whether the goal is met after the update; telling the
/// user about it is up to the caller.
pub fn deposit(state: &SavingsState, amount: Decimal) -> (SavingsState, bool) {
    let updated = SavingsState {
        current_savings: state.current_savings.saturating_add(amount),
        ..state.clone()
    };
    let goal_reached = updated.current_savings >= updated.goal;

    (updated, goal_reached)
}
