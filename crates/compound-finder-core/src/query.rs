//! Lookup engine over a built [`Catalog`].
//!
//! Two query kinds exist:
//!
//! | Kind | Resolution |
//! |------|------------|
//! | `compound` | formula → files, straight from the compound index |
//! | `category` | category → formulas → union of each formula's files |
//!
//! An absent key is not an error: it resolves to an empty file list. The
//! only error is an unknown query kind.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::index::Catalog;
use crate::normalize::{normalize, NormalizedKey};

/// Which index a query resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Compound,
    Category,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Compound => "compound",
            QueryKind::Category => "category",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryKind {
    type Err = QueryError;

    /// Exact match only: `"compound"` or `"category"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compound" => Ok(QueryKind::Compound),
            "category" => Ok(QueryKind::Category),
            other => Err(QueryError::InvalidQueryKind(other.to_string())),
        }
    }
}

/// Client-input errors raised by the query engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The requested kind is neither `compound` nor `category`.
    #[error("invalid search type: {0:?}")]
    InvalidQueryKind(String),
}

/// Answer to one query: the normalized key and the matching files.
///
/// `files` is sorted and duplicate-free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResponse {
    pub query: NormalizedKey,
    pub files: Vec<String>,
}

impl Catalog {
    /// Resolves `raw_key` against the index selected by `kind`.
    ///
    /// `kind` is parsed with [`QueryKind::from_str`]; anything else fails
    /// with [`QueryError::InvalidQueryKind`] regardless of the key.
    pub fn query(&self, raw_key: &str, kind: &str) -> Result<SearchResponse, QueryError> {
        let kind: QueryKind = kind.parse()?;
        Ok(self.search(raw_key, kind))
    }

    /// Typed, infallible form of [`Catalog::query`].
    pub fn search(&self, raw_key: &str, kind: QueryKind) -> SearchResponse {
        let key = normalize(Some(raw_key));
        let files = match kind {
            QueryKind::Compound => self.files_for_compound(&key),
            QueryKind::Category => self.files_for_category(&key),
        };
        SearchResponse {
            query: key,
            files: files.into_iter().map(str::to_string).collect(),
        }
    }

    fn files_for_compound(&self, formula: &NormalizedKey) -> BTreeSet<&str> {
        self.compounds
            .files(formula.as_str())
            .map(|files| files.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn files_for_category(&self, category: &NormalizedKey) -> BTreeSet<&str> {
        let mut files = BTreeSet::new();
        if let Some(formulas) = self.categories.formulas(category.as_str()) {
            for formula in formulas {
                files.extend(self.files_for_compound(formula));
            }
        }
        files
    }
}
