//! One-time catalog build from the configured workbooks.
//!
//! Runs synchronously before anything queries the catalog. Unreadable
//! workbooks are logged and skipped; the build itself cannot fail.

use compound_finder_core::Catalog;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::Config;
use crate::sources::WorkbookSource;

/// Reads every configured workbook and builds the immutable catalog.
pub fn load_catalog(config: &Config) -> Catalog {
    if config.master.is_none() {
        warn!("no [master] workbook configured; category search will return nothing");
    }
    if config.samples.is_none() {
        warn!("no [samples] configured; every search will return nothing");
    }

    let started = Instant::now();
    let catalog = Catalog::build(&WorkbookSource::new(config));
    let report = catalog.report();

    for failure in &report.unavailable {
        warn!(resource = %failure.resource, reason = %failure.reason, "source unavailable, skipped");
    }

    info!(
        formulas = catalog.compounds().len(),
        categories = catalog.categories().len(),
        files = catalog.compounds().distinct_files().len(),
        skipped = report.category_records.skipped + report.compound_records.skipped,
        unavailable = report.unavailable.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "catalog built"
    );

    catalog
}
