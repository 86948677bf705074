use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, info};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::budget::ledger::Ledger;
use crate::budget::transaction::{format_date, Transaction, TransactionKind};
use crate::budget::ValidationError;
use crate::clock::Clock;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read csv record: {0}")]
    Csv(#[from] csv::Error),
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

/// Transaction fields exactly as typed at a prompt or found in a CSV row.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawEntry {
    pub amount: String,
    pub category: String,
    #[serde(rename = "type", alias = "kind")]
    pub kind: String,
    #[serde(default)] // An empty or missing date means today
    pub date: String,
}

impl RawEntry {
    pub fn new(amount: &str, category: &str, kind: &str, date: &str) -> RawEntry {
        RawEntry {
            amount: amount.to_string(),
            category: category.to_string(),
            kind: kind.to_string(),
            date: date.to_string(),
        }
    }
}

fn parse_amount(raw: &str) -> Result<Decimal, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::MissingField("amount"));
    }

    let amount = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| ValidationError::InvalidAmount(raw.to_string()))?;

    if amount < Decimal::ZERO {
        return Err(ValidationError::InvalidAmount(raw.to_string()));
    }

    Ok(amount)
}

/// Validates one entry and turns it into a transaction.
pub fn parse_manual_entry(raw: &RawEntry, clock: &dyn Clock) -> Result<Transaction, ValidationError> {
    let amount = parse_amount(&raw.amount)?;

    if raw.category.trim().is_empty() {
        return Err(ValidationError::MissingField("category"));
    }

    let kind = TransactionKind::parse(&raw.kind)?;

    let date = match raw.date.trim() {
        "" => format_date(clock.today()),
        date => date.to_string(),
    };

    Transaction::new(amount, &raw.category, kind, &date)
}

/// All-or-nothing: the first invalid row rejects the whole batch.
pub fn parse_bulk_records<I>(rows: I, clock: &dyn Clock) -> Result<Vec<Transaction>, ValidationError>
where
    I: IntoIterator<Item = RawEntry>,
{
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            parse_manual_entry(&row, clock).map_err(|err| ValidationError::Row {
                row: index + 1,
                source: Box::new(err),
            })
        })
        .collect()
}

/// Reads rows with the header `amount,category,type,date`.
pub fn read_csv_records<R: io::Read>(reader: R) -> Result<Vec<RawEntry>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.deserialize::<RawEntry>() {
        rows.push(record?);
    }

    Ok(rows)
}

pub fn read_csv_file(path: &Path) -> Result<Vec<RawEntry>, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(read_csv_records(file)?)
}

/// Validates every row of the CSV file before appending any of them to the ledger.
pub fn import_csv(path: &Path, ledger: &mut Ledger, clock: &dyn Clock) -> Result<usize, IngestError> {
    let rows = read_csv_file(path)?;
    debug!("read {} rows from {}", rows.len(), path.display());

    let transactions = parse_bulk_records(rows, clock)?;
    let count = ledger.record_all(transactions);
    info!("imported {} transactions from {}", count, path.display());

    Ok(count)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use anyhow::{bail, Result};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::clock::FixedClock;

    fn clock() -> FixedClock {
        FixedClock(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
    }

    #[test]
    fn test_manual_entry() -> Result<()> {
        let transaction = parse_manual_entry(&RawEntry::new("12.50", "Food", "expense", "2024-01-05"), &clock())?;

        assert_eq!(transaction.amount(), dec!(12.50));
        assert_eq!(transaction.category(), "Food");
        assert_eq!(transaction.kind(), &TransactionKind::Expense);
        assert_eq!(transaction.date(), "2024-01-05");

        Ok(())
    }

    #[test]
    fn test_manual_entry_defaults_date_to_today() -> Result<()> {
        let transaction = parse_manual_entry(&RawEntry::new("3", "coffee", "Expense", "  "), &clock())?;
        assert_eq!(transaction.date(), "2024-03-15");

        Ok(())
    }

    #[test]
    fn test_manual_entry_amounts() -> Result<()> {
        assert_eq!(parse_manual_entry(&RawEntry::new("0", "a", "income", ""), &clock())?.amount(), dec!(0));
        assert_eq!(parse_manual_entry(&RawEntry::new("1e2", "a", "income", ""), &clock())?.amount(), dec!(100));

        for amount in ["-5", "abc", "NaN", "inf", "1,000"] {
            assert_eq!(
                parse_manual_entry(&RawEntry::new(amount, "a", "income", ""), &clock()),
                Err(ValidationError::InvalidAmount(amount.to_string()))
            );
        }
        assert_eq!(
            parse_manual_entry(&RawEntry::new("", "a", "income", ""), &clock()),
            Err(ValidationError::MissingField("amount"))
        );
        assert_eq!(
            parse_manual_entry(&RawEntry::new("5e28", "a", "expense", ""), &clock()),
            Err(ValidationError::AmountTooLarge(Decimal::from_scientific("5e28")?))
        );

        Ok(())
    }

    #[test]
    fn test_manual_entry_required_fields() {
        assert_eq!(
            parse_manual_entry(&RawEntry::new("1", "", "income", ""), &clock()),
            Err(ValidationError::MissingField("category"))
        );
        assert_eq!(
            parse_manual_entry(&RawEntry::new("1", "a", "", ""), &clock()),
            Err(ValidationError::MissingField("type"))
        );
        assert_eq!(
            parse_manual_entry(&RawEntry::new("1", "a", "gift", ""), &clock()),
            Err(ValidationError::InvalidKind("gift".to_string()))
        );
        assert_eq!(
            parse_manual_entry(&RawEntry::new("1", "a", "income", "15/03/2024"), &clock()),
            Err(ValidationError::InvalidDate("15/03/2024".to_string()))
        );
    }

    #[test]
    fn test_bulk_records_abort_on_first_bad_row() {
        let rows = vec![
            RawEntry::new("10", "food", "expense", "2024-01-01"),
            RawEntry::new("oops", "food", "expense", "2024-01-02"),
            RawEntry::new("-1", "food", "expense", "2024-01-03"),
        ];

        match parse_bulk_records(rows, &clock()) {
            Err(ValidationError::Row { row, source }) => {
                assert_eq!(row, 2);
                assert_eq!(*source, ValidationError::InvalidAmount("oops".to_string()));
            },
            other => panic!("expected a row error, got {:?}", other),
        }
    }

    #[test]
    fn test_read_csv_records() -> Result<()> {
        let data = "amount, category, type, date\n100, food, expense, 2024-01-05\n2500,salary,income,\n";
        let rows = read_csv_records(data.as_bytes())?;

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], RawEntry::new("100", "food", "expense", "2024-01-05"));
        assert_eq!(rows[1], RawEntry::new("2500", "salary", "income", ""));

        Ok(())
    }

    #[test]
    fn test_import_csv_appends_batch() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "amount,category,type,date\n100,food,expense,2024-01-05\n50,food,expense,2024-02-10\n")?;

        let mut ledger = Ledger::new();
        let count = import_csv(file.path(), &mut ledger, &clock())?;

        assert_eq!(count, 2);
        assert_eq!(ledger.transactions.len(), 2);
        assert_eq!(ledger.category_totals().get("food"), Some(dec!(150)));

        Ok(())
    }

    #[test]
    fn test_import_csv_rejects_whole_batch() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "amount,category,type,date\n100,food,expense,2024-01-05\n50,,expense,2024-02-10\n")?;

        let mut ledger = Ledger::new();
        match import_csv(file.path(), &mut ledger, &clock()) {
            Err(IngestError::Validation(ValidationError::Row { row: 2, .. })) => {},
            other => bail!("expected row 2 to fail, got {:?}", other),
        }
        assert!(ledger.transactions.is_empty());

        Ok(())
    }

    #[test]
    fn test_import_missing_file() {
        let mut ledger = Ledger::new();
        let result = import_csv(Path::new("/definitely/not/here.csv"), &mut ledger, &clock());
        assert!(matches!(result, Err(IngestError::Open { .. })));
    }
}
