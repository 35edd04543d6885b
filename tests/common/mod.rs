//! Shared fixtures: minimal xlsx workbooks written into a temp directory.

#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// One inline-string row; `cells` are `(column, text)` pairs.
pub fn row(n: usize, cells: &[(&str, &str)]) -> String {
    let mut out = format!("<row r=\"{}\">", n);
    for (col, text) in cells {
        out.push_str(&format!(
            "<c r=\"{}{}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
            col, n, text
        ));
    }
    out.push_str("</row>");
    out
}

/// Writes an xlsx with one worksheet per entry of `sheets` (each a list of rows).
pub fn write_xlsx(path: &Path, sheets: &[Vec<String>]) {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        let mut workbook = String::from(
            "<?xml version=\"1.0\"?><workbook xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\"><sheets>",
        );
        let mut rels = String::from("<?xml version=\"1.0\"?><Relationships>");
        for i in 1..=sheets.len() {
            workbook.push_str(&format!(
                "<sheet name=\"Sheet{}\" sheetId=\"{}\" r:id=\"rId{}\"/>",
                i, i, i
            ));
            rels.push_str(&format!(
                "<Relationship Id=\"rId{}\" Target=\"worksheets/sheet{}.xml\"/>",
                i, i
            ));
        }
        workbook.push_str("</sheets></workbook>");
        rels.push_str("</Relationships>");

        zip.start_file("xl/workbook.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(workbook.as_bytes()).unwrap();
        zip.start_file(
            "xl/_rels/workbook.xml.rels",
            zip::write::SimpleFileOptions::default(),
        )
        .unwrap();
        zip.write_all(rels.as_bytes()).unwrap();
        for (i, rows) in sheets.iter().enumerate() {
            zip.start_file(
                format!("xl/worksheets/sheet{}.xml", i + 1),
                zip::write::SimpleFileOptions::default(),
            )
            .unwrap();
            let xml = format!(
                "<?xml version=\"1.0\"?><worksheet><sheetData>{}</sheetData></worksheet>",
                rows.concat()
            );
            zip.write_all(xml.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    fs::write(path, buf).unwrap();
}

/// Creates a data directory with a master workbook, three sample workbooks
/// (one of them corrupt), and a config referencing a fourth, missing one.
///
/// Returns the temp dir guard and the config path.
pub fn setup_test_env(bind: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    let config_dir = root.join("config");
    let samples_dir = root.join("data").join("Sample files");
    fs::create_dir_all(&config_dir).unwrap();
    fs::create_dir_all(&samples_dir).unwrap();

    // Classification lives on the second sheet; the first is a cover page.
    write_xlsx(
        &root.join("data").join("HRMS_classifiedData.xlsx"),
        &[
            vec![row(1, &[("C", "Cover"), ("G", "NaOH")])],
            vec![
                row(1, &[("C", "Class"), ("G", "Formula")]),
                row(2, &[("C", "Acids"), ("G", "HCl")]),
                row(3, &[("C", "acids  "), ("G", "H2SO4")]),
                row(4, &[("C", "Sugars"), ("G", "C6H12O6")]),
                row(5, &[("C", "Bases")]),
            ],
        ],
    );

    write_xlsx(
        &samples_dir.join("SW1_ALL_Compounds.xlsx"),
        &[vec![
            row(1, &[("C", "HCl")]),
            row(2, &[("C", "C6H12O6")]),
        ]],
    );
    write_xlsx(
        &samples_dir.join("SW2_ALL_COMPOUNDS.xlsx"),
        &[vec![
            row(1, &[("C", "h2so4 ")]),
            row(2, &[("A", "no formula here")]),
            row(3, &[("C", "HCl")]),
        ]],
    );
    fs::write(samples_dir.join("SW3_ALL_COMPOUNDS.xlsx"), b"corrupt").unwrap();

    // Relative paths resolve against the config file's directory.
    let config_content = format!(
        r#"[server]
bind = "{}"

[master]
path = "../data/HRMS_classifiedData.xlsx"

[samples]
dir = "../data/Sample files"
files = [
    "SW1_ALL_Compounds.xlsx",
    "SW2_ALL_COMPOUNDS.xlsx",
    "SW3_ALL_COMPOUNDS.xlsx",
    "SW4_ALL_COMPOUNDS.xlsx",
]
"#,
        bind
    );

    let config_path = config_dir.join("cfind.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}
