use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;

pub mod aggregation;
pub mod alerts;
pub mod ledger;
pub mod savings;
pub mod transaction;


/// Utilization ratio at which a budget alert is raised.
pub const ALERT_THRESHOLD: Decimal = dec!(0.9);

/// Decimal places kept for derived amounts (ratios, monthly targets).
pub const PRECISION: u32 = 4;

/// Largest amount, budget limit or savings goal accepted from input.
///
/// Far below `Decimal::MAX` (about 7.9e28), so sums over any realistic ledger
/// stay exact. Totals saturate at `Decimal::MAX` instead of panicking when a
/// stored document carries bigger values. A stored number beyond the `Decimal`
/// range cannot be decoded, and its whole document loads as empty.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000000);

#[derive(Debug, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid amount '{0}', expected a non-negative number")]
    InvalidAmount(String),
    #[error("amount {0} exceeds the maximum of {max}", max = MAX_AMOUNT)]
    AmountTooLarge(Decimal),
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("invalid transaction type '{0}', expected income or expense")]
    InvalidKind(String),
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("malformed transaction date '{0}'")]
    MalformedDate(String),
    #[error("month {0} is out of range 1-12")]
    MonthOutOfRange(u32),
    #[error("{0} cannot be negative")]
    Negative(&'static str),
    #[error("row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: Box<ValidationError>,
    },
}

#[derive(Debug, PartialEq, Error)]
pub enum ArithmeticError {
    #[error("number of months must be positive, got {0}")]
    NonPositiveMonths(i64),
}
