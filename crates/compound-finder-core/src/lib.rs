//! # Compound Finder Core
//!
//! Pure logic for Compound Finder: key normalization, typed record
//! streams, the index builder, and the lookup engine.
//!
//! This crate does no filesystem or network I/O and pulls in no async
//! runtime. Spreadsheet reading and HTTP serving live in the
//! `compound-finder` application crate.
//!
//! ```
//! use compound_finder_core::{Catalog, CategoryRecord, CompoundRecord, StaticRecords};
//!
//! let source = StaticRecords::new(
//!     vec![CategoryRecord::new("Acids", "HCl")],
//!     vec![CompoundRecord::new("HCl", "SW1_ALL_Compounds.xlsx")],
//! );
//! let catalog = Catalog::build(&source);
//! let resp = catalog.query("acids", "category").unwrap();
//! assert_eq!(resp.files, vec!["SW1_ALL_Compounds.xlsx"]);
//! ```

pub mod index;
pub mod normalize;
pub mod query;
pub mod records;

pub use index::{BuildReport, Catalog, CategoryIndex, CompoundIndex, IndexBuilder, StreamReport};
pub use normalize::{normalize, NormalizedKey};
pub use query::{QueryError, QueryKind, SearchResponse};
pub use records::{
    CategoryRecord, CompoundRecord, RecordSource, RecordStream, SourceUnavailable, StaticRecords,
};
