//! The two lookup indexes and the builder that populates them.
//!
//! # Build Algorithm
//!
//! 1. For each category record, normalize category and formula. Skip the
//!    record if either is empty, otherwise add the formula to the
//!    category's set.
//! 2. For each compound record, normalize the formula. Skip the record if
//!    it is empty, otherwise add the file name to the formula's set.
//!
//! The two streams never depend on each other. Sets make the result
//! independent of record order and duplicate records.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::normalize::{normalize, NormalizedKey};
use crate::records::{CategoryRecord, CompoundRecord, RecordSource, SourceUnavailable};

/// Formula → names of the files that list it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundIndex {
    entries: HashMap<NormalizedKey, BTreeSet<String>>,
}

impl CompoundIndex {
    pub fn files(&self, formula: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(formula)
    }

    /// Number of distinct formulas.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct file names across all formulas.
    pub fn distinct_files(&self) -> BTreeSet<&str> {
        self.entries
            .values()
            .flat_map(|files| files.iter().map(String::as_str))
            .collect()
    }

    fn insert(&mut self, formula: NormalizedKey, file: &str) {
        let files = self.entries.entry(formula).or_default();
        if !files.contains(file) {
            files.insert(file.to_string());
        }
    }
}

/// Category → formulas classified under it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryIndex {
    entries: HashMap<NormalizedKey, BTreeSet<NormalizedKey>>,
}

impl CategoryIndex {
    pub fn formulas(&self, category: &str) -> Option<&BTreeSet<NormalizedKey>> {
        self.entries.get(category)
    }

    /// Number of distinct categories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted category names.
    pub fn categories(&self) -> Vec<&NormalizedKey> {
        let mut names: Vec<&NormalizedKey> = self.entries.keys().collect();
        names.sort();
        names
    }

    fn insert(&mut self, category: NormalizedKey, formula: NormalizedKey) {
        self.entries.entry(category).or_default().insert(formula);
    }
}

/// Per-stream counters gathered while building.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreamReport {
    /// Records that made it into an index.
    pub accepted: usize,
    /// Records dropped because a required field normalized to empty.
    pub skipped: usize,
}

/// Summary of one build, kept alongside the indexes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub category_records: StreamReport,
    pub compound_records: StreamReport,
    /// Resources that could not be read and contributed nothing.
    pub unavailable: Vec<SourceUnavailable>,
}

/// The immutable pair of indexes answering all queries.
///
/// Produced once by [`IndexBuilder`]; there is no way to mutate it
/// afterwards, so it can be shared behind an `Arc` without locking.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub(crate) compounds: CompoundIndex,
    pub(crate) categories: CategoryIndex,
    report: BuildReport,
}

impl Catalog {
    /// Builds a catalog from every record `source` yields.
    pub fn build(source: &dyn RecordSource) -> Self {
        IndexBuilder::new().ingest(source).finish()
    }

    pub fn compounds(&self) -> &CompoundIndex {
        &self.compounds
    }

    pub fn categories(&self) -> &CategoryIndex {
        &self.categories
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// True when both catalogs hold the same index contents, ignoring
    /// the build reports.
    pub fn same_indexes(&self, other: &Catalog) -> bool {
        self.compounds == other.compounds && self.categories == other.categories
    }
}

/// Exclusive owner of the indexes while they are being populated.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    compounds: CompoundIndex,
    categories: CategoryIndex,
    report: BuildReport,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one category record, or counts it as skipped.
    pub fn add_category_record(&mut self, record: &CategoryRecord) {
        let category = normalize(Some(record.category.as_str()));
        let formula = normalize(Some(record.formula.as_str()));
        if category.is_empty() || formula.is_empty() {
            self.report.category_records.skipped += 1;
            return;
        }
        self.categories.insert(category, formula);
        self.report.category_records.accepted += 1;
    }

    /// Adds one compound record, or counts it as skipped.
    pub fn add_compound_record(&mut self, record: &CompoundRecord) {
        let formula = normalize(Some(record.formula.as_str()));
        if formula.is_empty() {
            self.report.compound_records.skipped += 1;
            return;
        }
        self.compounds.insert(formula, &record.file);
        self.report.compound_records.accepted += 1;
    }

    /// Notes a resource that produced no records.
    pub fn add_failure(&mut self, failure: SourceUnavailable) {
        self.report.unavailable.push(failure);
    }

    /// Drains both streams of `source` into the indexes.
    pub fn ingest(mut self, source: &dyn RecordSource) -> Self {
        let categories = source.category_records();
        for record in &categories.records {
            self.add_category_record(record);
        }
        for failure in categories.failures {
            self.add_failure(failure);
        }

        let compounds = source.compound_records();
        for record in &compounds.records {
            self.add_compound_record(record);
        }
        for failure in compounds.failures {
            self.add_failure(failure);
        }
        self
    }

    pub fn finish(self) -> Catalog {
        Catalog {
            compounds: self.compounds,
            categories: self.categories,
            report: self.report,
        }
    }
}
