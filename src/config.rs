//! TOML configuration parsing and validation.
//!
//! The config names the master classification workbook, the sample
//! workbooks to index, and the server bind address. See
//! `config/cfind.example.toml` for a full example.
//!
//! Relative paths are resolved against the directory holding the config
//! file, so a config can be moved together with its data directory.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the port in `[server].bind`.
pub const PORT_ENV: &str = "PORT";

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "./config/cfind.toml";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    /// Workbook supplying `(category, formula)` records.
    #[serde(default)]
    pub master: Option<MasterConfig>,
    /// Workbooks supplying `(formula, file)` records.
    #[serde(default)]
    pub samples: Option<SamplesConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct MasterConfig {
    pub path: PathBuf,
    /// Zero-based sheet index. The classification lives on the second sheet.
    #[serde(default = "default_master_sheet")]
    pub sheet: usize,
    #[serde(default = "default_category_column")]
    pub category_column: String,
    #[serde(default = "default_master_formula_column")]
    pub formula_column: String,
}

fn default_master_sheet() -> usize {
    1
}
fn default_category_column() -> String {
    "C".to_string()
}
fn default_master_formula_column() -> String {
    "G".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SamplesConfig {
    pub dir: PathBuf,
    /// Explicit workbook names under `dir`, indexed in this order.
    #[serde(default)]
    pub files: Vec<String>,
    /// Extra workbooks discovered under `dir` by glob.
    #[serde(default)]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub sheet: usize,
    #[serde(default = "default_sample_formula_column")]
    pub formula_column: String,
}

fn default_sample_formula_column() -> String {
    "C".to_string()
}

impl Config {
    /// A config with no data sources and the default bind address.
    pub fn minimal() -> Self {
        Self {
            server: ServerConfig::default(),
            master: None,
            samples: None,
        }
    }

    /// Rewrites relative data paths so they hang off `base`.
    fn resolve_paths(&mut self, base: &Path) {
        if let Some(master) = self.master.as_mut() {
            if master.path.is_relative() {
                master.path = base.join(&master.path);
            }
        }
        if let Some(samples) = self.samples.as_mut() {
            if samples.dir.is_relative() {
                samples.dir = base.join(&samples.dir);
            }
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(port) = std::env::var(PORT_ENV) {
            self.override_port(&port)?;
        }
        Ok(())
    }

    /// Replaces the port of `server.bind` with `port`.
    fn override_port(&mut self, port: &str) -> Result<()> {
        let port: u16 = port
            .trim()
            .parse()
            .with_context(|| format!("{} must be a port number, got '{}'", PORT_ENV, port))?;
        let host = match self.server.bind.rsplit_once(':') {
            Some((host, _)) => host.to_string(),
            None => self.server.bind.clone(),
        };
        self.server.bind = format!("{}:{}", host, port);
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config = parse_config(&content)?;

    let base = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    config.resolve_paths(base);
    config.apply_env()?;

    Ok(config)
}

/// Loads the config named on the command line.
///
/// An explicit path must exist. Without one, `DEFAULT_CONFIG_PATH` is used
/// when present; otherwise the minimal config is returned, which serves an
/// empty catalog.
pub fn load_cli_config(explicit: Option<&Path>) -> Result<Config> {
    load_or_minimal(explicit, Path::new(DEFAULT_CONFIG_PATH))
}

fn load_or_minimal(explicit: Option<&Path>, default: &Path) -> Result<Config> {
    match explicit {
        Some(path) => load_config(path),
        None if default.exists() => load_config(default),
        None => {
            tracing::warn!(
                path = %default.display(),
                "no config file found, using an empty configuration"
            );
            let mut config = Config::minimal();
            config.apply_env()?;
            Ok(config)
        }
    }
}

/// Parses and validates config text without touching the filesystem.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if !config.server.bind.contains(':') {
        bail!(
            "server.bind must be HOST:PORT, got '{}'",
            config.server.bind
        );
    }

    if let Some(master) = &config.master {
        validate_column("master.category_column", &master.category_column)?;
        validate_column("master.formula_column", &master.formula_column)?;
    }

    if let Some(samples) = &config.samples {
        validate_column("samples.formula_column", &samples.formula_column)?;
        for pattern in &samples.include_globs {
            globset::Glob::new(pattern)
                .with_context(|| format!("samples.include_globs: invalid pattern '{}'", pattern))?;
        }
    }

    Ok(())
}

/// Spreadsheet columns run from `A` to `XFD`.
fn validate_column(field: &str, column: &str) -> Result<()> {
    let valid = !column.is_empty()
        && column.len() <= 3
        && column.bytes().all(|b| b.is_ascii_uppercase())
        && (column.len() < 3 || column <= "XFD");
    if !valid {
        bail!(
            "{} must be a column letter between A and XFD, got '{}'",
            field,
            column
        );
    }
    Ok(())
}
