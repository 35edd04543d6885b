//! One-shot lookups from the command line (`cfind search`).

use anyhow::Result;
use compound_finder_core::QueryKind;

use crate::catalog::load_catalog;
use crate::config::Config;

/// Builds the catalog, runs one query, and prints the matching files.
///
/// With `json`, prints the same body `GET /search` would return.
pub fn run_search(config: &Config, query: &str, kind: &str, json: bool) -> Result<()> {
    // Reject a bad kind before paying for the build.
    let kind: QueryKind = kind.parse()?;

    let catalog = load_catalog(config);
    let resp = catalog.search(query, kind);

    if json {
        println!("{}", serde_json::to_string_pretty(&resp)?);
        return Ok(());
    }

    if resp.files.is_empty() {
        println!("No files contain {} \"{}\".", kind, resp.query);
        return Ok(());
    }

    println!(
        "{} file(s) contain {} \"{}\":",
        resp.files.len(),
        kind,
        resp.query
    );
    for file in &resp.files {
        println!("  {}", file);
    }
    Ok(())
}
