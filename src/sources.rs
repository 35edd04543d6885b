//! Workbook-backed record source and the `cfind sources` listing.
//!
//! [`WorkbookSource`] turns the configured spreadsheets into the typed
//! record streams the core builder consumes:
//!
//! | Workbook | Sheet (default) | Columns (default) | Records |
//! |----------|-----------------|-------------------|---------|
//! | master | 2nd | category `C`, formula `G` | `(category, formula)` |
//! | each sample | 1st | formula `C` | `(formula, file name)` |
//!
//! A workbook that is missing or unreadable is reported as
//! [`SourceUnavailable`] and contributes no records.

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use compound_finder_core::{
    CategoryRecord, CompoundRecord, RecordSource, RecordStream, SourceUnavailable,
};

use crate::config::{Config, MasterConfig, SamplesConfig};
use crate::xlsx::{SheetRow, Workbook, XlsxError};

/// A sample workbook to index, with the identifier returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleFile {
    /// Name reported in search results (path relative to the samples dir).
    pub name: String,
    pub path: PathBuf,
}

/// [`RecordSource`] reading the master and sample workbooks from disk.
#[derive(Debug, Clone)]
pub struct WorkbookSource {
    master: Option<MasterConfig>,
    samples: Option<SamplesConfig>,
}

impl WorkbookSource {
    pub fn new(config: &Config) -> Self {
        Self {
            master: config.master.clone(),
            samples: config.samples.clone(),
        }
    }

    /// Sample workbooks in indexing order: explicit `files` first, then any
    /// glob matches not already listed, sorted by name.
    pub fn sample_files(&self) -> Result<Vec<SampleFile>> {
        match &self.samples {
            Some(samples) => resolve_sample_files(samples),
            None => Ok(Vec::new()),
        }
    }
}

impl RecordSource for WorkbookSource {
    fn category_records(&self) -> RecordStream<CategoryRecord> {
        let Some(master) = &self.master else {
            return RecordStream::empty();
        };
        match read_rows(&master.path, master.sheet) {
            Ok(rows) => RecordStream::new(
                rows.iter()
                    .map(|row| {
                        CategoryRecord::new(
                            row.get(&master.category_column).unwrap_or_default(),
                            row.get(&master.formula_column).unwrap_or_default(),
                        )
                    })
                    .collect(),
            ),
            Err(e) => {
                let mut stream = RecordStream::empty();
                stream.push_failure(SourceUnavailable::new(
                    master.path.display().to_string(),
                    e,
                ));
                stream
            }
        }
    }

    fn compound_records(&self) -> RecordStream<CompoundRecord> {
        let Some(samples) = &self.samples else {
            return RecordStream::empty();
        };
        let files = match resolve_sample_files(samples) {
            Ok(files) => files,
            Err(e) => {
                let mut stream = RecordStream::empty();
                stream.push_failure(SourceUnavailable::new(
                    samples.dir.display().to_string(),
                    format!("{:#}", e),
                ));
                return stream;
            }
        };

        let mut stream = RecordStream::empty();
        for file in files {
            match read_rows(&file.path, samples.sheet) {
                Ok(rows) => {
                    // Rows without a formula cell are not records at all.
                    stream.records.extend(rows.iter().filter_map(|row| {
                        row.get(&samples.formula_column)
                            .map(|formula| CompoundRecord::new(formula, file.name.clone()))
                    }));
                }
                Err(e) => stream.push_failure(SourceUnavailable::new(
                    file.path.display().to_string(),
                    e,
                )),
            }
        }
        stream
    }
}

fn read_rows(path: &Path, sheet: usize) -> Result<Vec<SheetRow>, XlsxError> {
    let mut workbook = Workbook::open(path)?;
    workbook.sheet_rows(sheet)
}

fn resolve_sample_files(samples: &SamplesConfig) -> Result<Vec<SampleFile>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for name in &samples.files {
        if seen.insert(name.clone()) {
            out.push(SampleFile {
                name: name.clone(),
                path: samples.dir.join(name),
            });
        }
    }

    if samples.include_globs.is_empty() {
        return Ok(out);
    }

    let include_set = build_globset(&samples.include_globs)?;
    let mut discovered = Vec::new();
    if samples.dir.is_dir() {
        for entry in WalkDir::new(&samples.dir) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(&samples.dir).unwrap_or(path);
            let rel_str = relative.to_string_lossy().replace('\\', "/");
            if include_set.is_match(&rel_str) && !seen.contains(&rel_str) {
                seen.insert(rel_str.clone());
                discovered.push(SampleFile {
                    name: rel_str,
                    path: path.to_path_buf(),
                });
            }
        }
    }

    // Sort for deterministic ordering
    discovered.sort_by(|a, b| a.name.cmp(&b.name));
    out.extend(discovered);
    Ok(out)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Health of one configured workbook.
#[derive(Debug, Clone)]
pub struct SourceStatus {
    /// `master` or `sample`.
    pub role: &'static str,
    pub name: String,
    pub status: String,
    pub healthy: bool,
}

/// Checks that every configured workbook opens and has the configured sheet.
pub fn get_sources(config: &Config) -> Result<Vec<SourceStatus>> {
    let source = WorkbookSource::new(config);
    let mut out = Vec::new();

    if let Some(master) = &config.master {
        out.push(check_workbook(
            "master",
            master.path.display().to_string(),
            &master.path,
            master.sheet,
        ));
    }

    if let Some(samples) = &config.samples {
        for file in source.sample_files()? {
            out.push(check_workbook("sample", file.name, &file.path, samples.sheet));
        }
    }

    Ok(out)
}

fn check_workbook(role: &'static str, name: String, path: &Path, sheet: usize) -> SourceStatus {
    let (status, healthy) = if !path.exists() {
        ("MISSING".to_string(), false)
    } else {
        match Workbook::open(path) {
            Ok(wb) if sheet < wb.sheet_count() => ("OK".to_string(), true),
            Ok(wb) => (
                format!("NO SHEET {} (has {})", sheet + 1, wb.sheet_count()),
                false,
            ),
            Err(e) => (format!("UNREADABLE ({})", e), false),
        }
    };
    SourceStatus {
        role,
        name,
        status,
        healthy,
    }
}

pub fn list_sources(config: &Config) -> Result<()> {
    let sources = get_sources(config)?;
    if sources.is_empty() {
        println!("No workbooks configured.");
        return Ok(());
    }

    println!("{:<8} {:<40} {:<24} HEALTHY", "ROLE", "WORKBOOK", "STATUS");
    for s in &sources {
        println!("{:<8} {:<40} {:<24} {}", s.role, s.name, s.status, s.healthy);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::xlsx::tests::build_xlsx;
    use compound_finder_core::Catalog;
    use tempfile::TempDir;

    fn inline_row(n: usize, cells: &[(&str, &str)]) -> String {
        let mut row = format!("<row r=\"{}\">", n);
        for (col, text) in cells {
            row.push_str(&format!(
                "<c r=\"{}{}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                col, n, text
            ));
        }
        row.push_str("</row>");
        row
    }

    fn sheet(rows: &[String]) -> String {
        format!(
            "<?xml version=\"1.0\"?><worksheet><sheetData>{}</sheetData></worksheet>",
            rows.concat()
        )
    }

    fn write_fixture(tmp: &TempDir) -> Config {
        let data = tmp.path().join("data");
        let samples = data.join("Sample files");
        std::fs::create_dir_all(&samples).unwrap();

        let master = build_xlsx(
            &[
                ("Overview", sheet(&[inline_row(1, &[("C", "ignored")])]).as_str()),
                (
                    "Classified",
                    sheet(&[
                        inline_row(1, &[("C", "Acids"), ("G", "HCl")]),
                        inline_row(2, &[("C", "acids"), ("G", "H2SO4")]),
                        inline_row(3, &[("C", "Salts")]),
                    ])
                    .as_str(),
                ),
            ],
            None,
        );
        std::fs::write(data.join("master.xlsx"), master).unwrap();

        let s1 = build_xlsx(
            &[(
                "S",
                sheet(&[inline_row(1, &[("C", "HCl")]), inline_row(2, &[("A", "x")])]).as_str(),
            )],
            None,
        );
        let s2 = build_xlsx(
            &[("S", sheet(&[inline_row(1, &[("C", " h2so4 ")])]).as_str())],
            None,
        );
        std::fs::write(samples.join("S1.xlsx"), s1).unwrap();
        std::fs::write(samples.join("S2.xlsx"), s2).unwrap();
        std::fs::write(samples.join("broken.xlsx"), b"not a zip").unwrap();

        parse_config(&format!(
            r#"
[master]
path = "{}"

[samples]
dir = "{}"
files = ["S1.xlsx", "S2.xlsx", "broken.xlsx", "missing.xlsx"]
"#,
            data.join("master.xlsx").display(),
            samples.display()
        ))
        .unwrap()
    }

    #[test]
    fn test_category_records_from_second_sheet() {
        let tmp = TempDir::new().unwrap();
        let cfg = write_fixture(&tmp);
        let stream = WorkbookSource::new(&cfg).category_records();
        assert!(stream.failures.is_empty());
        assert_eq!(stream.records.len(), 3);
        assert_eq!(stream.records[0], CategoryRecord::new("Acids", "HCl"));
        assert_eq!(stream.records[2], CategoryRecord::new("Salts", ""));
    }

    #[test]
    fn test_compound_records_skip_bad_files() {
        let tmp = TempDir::new().unwrap();
        let cfg = write_fixture(&tmp);
        let stream = WorkbookSource::new(&cfg).compound_records();
        assert_eq!(
            stream.records,
            vec![
                CompoundRecord::new("HCl", "S1.xlsx"),
                CompoundRecord::new(" h2so4 ", "S2.xlsx"),
            ]
        );
        assert_eq!(stream.failures.len(), 2);
        assert!(stream.failures[0].resource.ends_with("broken.xlsx"));
        assert!(stream.failures[1].resource.ends_with("missing.xlsx"));
    }

    #[test]
    fn test_catalog_from_workbooks() {
        let tmp = TempDir::new().unwrap();
        let cfg = write_fixture(&tmp);
        let catalog = Catalog::build(&WorkbookSource::new(&cfg));
        let resp = catalog.query("ACIDS", "category").unwrap();
        assert_eq!(resp.files, vec!["S1.xlsx", "S2.xlsx"]);
        assert_eq!(catalog.report().unavailable.len(), 2);
    }

    #[test]
    fn test_missing_master_is_reported() {
        let tmp = TempDir::new().unwrap();
        let mut cfg = write_fixture(&tmp);
        cfg.master.as_mut().unwrap().path = tmp.path().join("nope.xlsx");
        let stream = WorkbookSource::new(&cfg).category_records();
        assert!(stream.records.is_empty());
        assert_eq!(stream.failures.len(), 1);
    }

    #[test]
    fn test_glob_discovery_appends_unlisted_files() {
        let tmp = TempDir::new().unwrap();
        let mut cfg = write_fixture(&tmp);
        let samples = cfg.samples.as_mut().unwrap();
        samples.files = vec!["S2.xlsx".to_string()];
        samples.include_globs = vec!["S*.xlsx".to_string()];
        let names: Vec<String> = WorkbookSource::new(&cfg)
            .sample_files()
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["S2.xlsx", "S1.xlsx"]);
    }

    #[test]
    fn test_source_health() {
        let tmp = TempDir::new().unwrap();
        let cfg = write_fixture(&tmp);
        let statuses = get_sources(&cfg).unwrap();
        assert_eq!(statuses.len(), 5);
        assert_eq!(statuses[0].role, "master");
        assert!(statuses[0].healthy);
        let unhealthy: Vec<&str> = statuses
            .iter()
            .filter(|s| !s.healthy)
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(unhealthy, vec!["broken.xlsx", "missing.xlsx"]);
    }
}
