//! Record types and the [`RecordSource`] abstraction.
//!
//! A record source hands the index builder two independent streams of
//! typed records. Where the records come from (spreadsheets, fixtures,
//! anything else) is invisible to the rest of the core.

use serde::Serialize;
use std::fmt;

/// One `(category, formula)` pair from the classification data.
///
/// Fields hold raw, unnormalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRecord {
    pub category: String,
    pub formula: String,
}

impl CategoryRecord {
    pub fn new(category: impl Into<String>, formula: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            formula: formula.into(),
        }
    }
}

/// One `(formula, file)` pair: `file` lists `formula` among its compounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundRecord {
    pub formula: String,
    pub file: String,
}

impl CompoundRecord {
    pub fn new(formula: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            formula: formula.into(),
            file: file.into(),
        }
    }
}

/// A resource that could not be read or parsed while producing records.
///
/// Not fatal: the resource contributes zero records and the build goes on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceUnavailable {
    /// Identifier of the resource (usually a file path).
    pub resource: String,
    /// Human-readable cause.
    pub reason: String,
}

impl SourceUnavailable {
    pub fn new(resource: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for SourceUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.resource, self.reason)
    }
}

/// A finite batch of records plus the resources that failed to produce any.
#[derive(Debug, Clone)]
pub struct RecordStream<T> {
    pub records: Vec<T>,
    pub failures: Vec<SourceUnavailable>,
}

impl<T> RecordStream<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self {
            records,
            failures: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Records a resource that produced nothing.
    pub fn push_failure(&mut self, failure: SourceUnavailable) {
        self.failures.push(failure);
    }
}

impl<T> Default for RecordStream<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Supplier of the two record streams consumed by the index builder.
///
/// Each method is called once per build. Implementations report unreadable
/// resources through [`RecordStream::failures`] instead of returning an
/// error, so one bad file never aborts the build.
pub trait RecordSource: Send + Sync {
    fn category_records(&self) -> RecordStream<CategoryRecord>;

    fn compound_records(&self) -> RecordStream<CompoundRecord>;
}

/// In-memory [`RecordSource`] backed by plain vectors.
#[derive(Debug, Clone, Default)]
pub struct StaticRecords {
    pub categories: Vec<CategoryRecord>,
    pub compounds: Vec<CompoundRecord>,
}

impl StaticRecords {
    pub fn new(categories: Vec<CategoryRecord>, compounds: Vec<CompoundRecord>) -> Self {
        Self {
            categories,
            compounds,
        }
    }
}

impl RecordSource for StaticRecords {
    fn category_records(&self) -> RecordStream<CategoryRecord> {
        RecordStream::new(self.categories.clone())
    }

    fn compound_records(&self) -> RecordStream<CompoundRecord> {
        RecordStream::new(self.compounds.clone())
    }
}
