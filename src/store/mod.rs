//! Persistence of the ledger as three independent JSON documents.
//!
//! Each document is replaced atomically, but a save is not atomic across
//! documents: when one write fails the others are still written, so the
//! transactions, budgets and savings files can end up from different saves.
//!
//! Amounts are JSON numbers decoded into `Decimal`, which holds magnitudes up
//! to about 7.9e28. A document with a bigger number is unparseable as a whole
//! and loads as empty (see `LoadReport::damaged`). Input validation caps
//! amounts at `MAX_AMOUNT` well below that.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::budget::ledger::Ledger;
use crate::budget::transaction::Transaction;

pub mod medium;


pub use medium::{Backend, FileMedium, MemoryMedium, Medium};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    Transactions,
    Budgets,
    Savings,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Transactions, Resource::Budgets, Resource::Savings];

    pub fn file_name(&self) -> &'static str {
        match self {
            Resource::Transactions => "transactions.json",
            Resource::Budgets => "budgets.json",
            Resource::Savings => "savings.json",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Transactions => "transactions",
            Resource::Budgets => "budgets",
            Resource::Savings => "savings",
        })
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {resource}: {source}")]
    Read {
        resource: Resource,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {resource}: {source}")]
    Write {
        resource: Resource,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode {resource}: {source}")]
    Encode {
        resource: Resource,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to export to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Every resource that could not be written during a save.
#[derive(Debug, Error)]
#[error("failed to save {}", failed_resources(.failures))]
pub struct SaveError {
    pub failures: Vec<StorageError>,
}

fn failed_resources(failures: &[StorageError]) -> String {
    failures
        .iter()
        .map(|failure| failure.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyReason {
    Missing,
    Unreadable(String),
    Unparseable(String),
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyReason::Missing => f.write_str("not found"),
            EmptyReason::Unreadable(err) => write!(f, "unreadable: {}", err),
            EmptyReason::Unparseable(err) => write!(f, "unparseable: {}", err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded,
    /// The resource was replaced by its empty default.
    InitializedEmpty(EmptyReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub ledger: Ledger,
    pub statuses: Vec<(Resource, LoadStatus)>,
}

impl LoadReport {
    pub fn status(&self, resource: Resource) -> Option<&LoadStatus> {
        self.statuses
            .iter()
            .find(|(candidate, _)| *candidate == resource)
            .map(|(_, status)| status)
    }

    /// Resources that fell back to their empty default.
    pub fn initialized_empty(&self) -> impl Iterator<Item = (Resource, &EmptyReason)> {
        self.statuses.iter().filter_map(|(resource, status)| match status {
            LoadStatus::InitializedEmpty(reason) => Some((*resource, reason)),
            LoadStatus::Loaded => None,
        })
    }

    /// Resources that exist but could not be read or decoded.
    ///
    /// Saving over them would replace the stored data with the empty default.
    pub fn damaged(&self) -> Vec<Resource> {
        self.initialized_empty()
            .filter(|(_, reason)| !matches!(reason, EmptyReason::Missing))
            .map(|(resource, _)| resource)
            .collect()
    }

    pub fn fully_loaded(&self) -> bool {
        self.initialized_empty().next().is_none()
    }
}

pub struct LedgerStore {
    medium: Backend,
}

impl LedgerStore {
    pub fn new(medium: impl Into<Backend>) -> LedgerStore {
        LedgerStore { medium: medium.into() }
    }

    /// Store backed by JSON files in `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> LedgerStore {
        LedgerStore::new(FileMedium::new(dir))
    }

    /// Loads the three resources independently, never failing as a whole.
    pub fn load(&self) -> LoadReport {
        let (transactions, transactions_status) = self.load_resource(Resource::Transactions);
        let (budgets, budgets_status) = self.load_resource(Resource::Budgets);
        let (savings, savings_status) = self.load_resource(Resource::Savings);

        LoadReport {
            ledger: Ledger {
                transactions,
                budgets,
                savings,
            },
            statuses: vec![
                (Resource::Transactions, transactions_status),
                (Resource::Budgets, budgets_status),
                (Resource::Savings, savings_status),
            ],
        }
    }

    fn load_resource<T>(&self, resource: Resource) -> (T, LoadStatus)
    where
        T: DeserializeOwned + Default,
    {
        let reason = match self.medium.read(resource) {
            Ok(Some(contents)) => match serde_json::from_str(&contents) {
                Ok(value) => {
                    debug!("loaded {}", resource);
                    return (value, LoadStatus::Loaded);
                },
                Err(err) => EmptyReason::Unparseable(err.to_string()),
            },
            Ok(None) => EmptyReason::Missing,
            Err(err) => EmptyReason::Unreadable(err.to_string()),
        };

        match &reason {
            EmptyReason::Missing => info!("no {} found, starting empty", resource),
            EmptyReason::Unreadable(err) | EmptyReason::Unparseable(err) => {
                warn!("could not load {}, starting empty, err={}", resource, err)
            },
        }

        (T::default(), LoadStatus::InitializedEmpty(reason))
    }

    /// Writes every resource, carrying on past failures.
    pub fn save(&self, ledger: &Ledger) -> Result<(), SaveError> {
        self.save_skipping(ledger, &[])
    }

    /// Like `save`, but leaves the resources in `skip` untouched on the medium.
    pub fn save_skipping(&self, ledger: &Ledger, skip: &[Resource]) -> Result<(), SaveError> {
        let mut failures = Vec::new();
        for resource in Resource::ALL {
            if skip.contains(&resource) {
                warn!("not saving {}, the stored copy was left as is", resource);
                continue;
            }

            let saved = match resource {
                Resource::Transactions => self.save_resource(resource, &ledger.transactions),
                Resource::Budgets => self.save_resource(resource, &ledger.budgets),
                Resource::Savings => self.save_resource(resource, &ledger.savings),
            };
            if let Err(err) = saved {
                failures.push(err);
            }
        }

        if failures.is_empty() {
            debug!("ledger saved");
            return Ok(());
        }

        for failure in &failures {
            warn!("{}", failure);
        }
        Err(SaveError { failures })
    }

    fn save_resource<T: Serialize>(&self, resource: Resource, value: &T) -> Result<(), StorageError> {
        let contents = encode(resource, value)?;
        self.medium
            .write(resource, &contents)
            .map_err(|source| StorageError::Write { resource, source })
    }

    /// Writes an empty document for every resource that does not exist yet.
    pub fn ensure_initialized(&self) -> Result<Vec<Resource>, StorageError> {
        let defaults = Ledger::default();
        let mut created = Vec::new();

        for resource in Resource::ALL {
            let existing = self
                .medium
                .read(resource)
                .map_err(|source| StorageError::Read { resource, source })?;
            if existing.is_some() {
                continue;
            }

            match resource {
                Resource::Transactions => self.save_resource(resource, &defaults.transactions)?,
                Resource::Budgets => self.save_resource(resource, &defaults.budgets)?,
                Resource::Savings => self.save_resource(resource, &defaults.savings)?,
            }
            info!("created empty {}", resource);
            created.push(resource);
        }

        Ok(created)
    }
}

fn encode<T: Serialize>(resource: Resource, value: &T) -> Result<String, StorageError> {
    serde_json::to_string_pretty(value).map_err(|source| StorageError::Encode { resource, source })
}

/// Writes the transactions document to an arbitrary path.
pub fn export_transactions(transactions: &[Transaction], path: &Path) -> Result<(), StorageError> {
    let contents = encode(Resource::Transactions, &transactions)?;
    medium::write_atomic(path, &contents).map_err(|source| StorageError::Export {
        path: path.to_path_buf(),
        source,
    })?;

    info!("exported {} transactions to {}", transactions.len(), path.display());
    Ok(())
}
