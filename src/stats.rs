//! Catalog statistics (`cfind stats`).
//!
//! Builds the catalog exactly as `cfind serve` would and prints what ended
//! up in it, so a config can be checked before starting the server.

use anyhow::Result;

use crate::catalog::load_catalog;
use crate::config::Config;

/// Run the stats command: build the catalog and print a summary.
pub fn run_stats(config: &Config) -> Result<()> {
    let catalog = load_catalog(config);
    let report = catalog.report();

    println!("Compound Finder: Catalog Stats");
    println!("==============================");
    println!();
    println!("  Formulas:     {}", catalog.compounds().len());
    println!("  Categories:   {}", catalog.categories().len());
    println!(
        "  Sample files: {}",
        catalog.compounds().distinct_files().len()
    );
    println!();
    println!(
        "  Category records: {} accepted, {} skipped",
        report.category_records.accepted, report.category_records.skipped
    );
    println!(
        "  Compound records: {} accepted, {} skipped",
        report.compound_records.accepted, report.compound_records.skipped
    );

    if report.unavailable.is_empty() {
        println!("  Unavailable sources: none");
    } else {
        println!("  Unavailable sources: {}", report.unavailable.len());
        for failure in &report.unavailable {
            println!("    {}", failure);
        }
    }

    Ok(())
}
