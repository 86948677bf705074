use std::fmt;

use chrono::NaiveDate;
use getset::{CopyGetters, Getters};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ValidationError, MAX_AMOUNT};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Direction of a transaction.
///
/// Ingestion only ever produces `Income` or `Expense`. `Other` keeps any other
/// string found in a stored ledger so that it survives a load/save cycle; it is
/// never counted as spending.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionKind {
    Income,
    Expense,
    Other(String),
}

impl TransactionKind {
    /// Parses user supplied input, accepting `income`/`expense` in any case.
    pub fn parse(raw: &str) -> Result<TransactionKind, ValidationError> {
        match raw.trim().to_lowercase().as_str() {
            "" => Err(ValidationError::MissingField("type")),
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            _ => Err(ValidationError::InvalidKind(raw.trim().to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
            TransactionKind::Other(kind) => kind,
        }
    }

    pub fn is_expense(&self) -> bool {
        self == &TransactionKind::Expense
    }
}

impl From<String> for TransactionKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "income" => TransactionKind::Income,
            "expense" => TransactionKind::Expense,
            _ => TransactionKind::Other(kind),
        }
    }
}

impl From<TransactionKind> for String {
    fn from(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Getters, CopyGetters, Serialize, Deserialize)]
pub struct Transaction {
    #[getset(get_copy = "pub")]
    amount: Decimal,
    #[getset(get = "pub")]
    category: String,
    #[getset(get = "pub")]
    #[serde(alias = "type")]
    kind: TransactionKind,
    #[getset(get = "pub")]
    date: String,
}

impl Transaction {
    pub fn new(
        amount: Decimal,
        category: &str,
        kind: TransactionKind,
        date: &str,
    ) -> Result<Transaction, ValidationError> {
        if amount < Decimal::ZERO {
            return Err(ValidationError::InvalidAmount(amount.to_string()));
        }
        if amount > MAX_AMOUNT {
            return Err(ValidationError::AmountTooLarge(amount));
        }

        let category = category.trim();
        if category.is_empty() {
            return Err(ValidationError::MissingField("category"));
        }

        validate_date(date)?;

        Ok(Transaction {
            amount,
            category: category.to_string(),
            kind,
            date: date.to_string(),
        })
    }

    /// Month number taken from the second `-` separated field of the date.
    ///
    /// Stored ledgers are not re-validated on load, so this can still fail.
    pub fn month(&self) -> Result<u32, ValidationError> {
        let fields: Vec<&str> = self.date.split('-').collect();
        if fields.len() != 3 {
            return Err(ValidationError::MalformedDate(self.date.clone()));
        }

        fields[1]
            .trim()
            .parse::<u32>()
            .map_err(|_| ValidationError::MalformedDate(self.date.clone()))
    }
}

/// Returns a new collection with `transaction` appended, leaving the input untouched.
pub fn append(transactions: &[Transaction], transaction: Transaction) -> Vec<Transaction> {
    let mut appended = Vec::with_capacity(transactions.len() + 1);
    appended.extend_from_slice(transactions);
    appended.push(transaction);
    appended
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Strict `YYYY-MM-DD`: zero padded fields and a real calendar day.
pub fn validate_date(raw: &str) -> Result<(), ValidationError> {
    let bytes = raw.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());

    if !shaped || NaiveDate::parse_from_str(raw, DATE_FORMAT).is_err() {
        return Err(ValidationError::InvalidDate(raw.to_string()));
    }

    Ok(())
}
