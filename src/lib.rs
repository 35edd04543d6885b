//! # Compound Finder
//!
//! Indexes chemical compounds listed across a set of spreadsheet files and
//! answers two questions: which files contain a given compound, and which
//! files contain any compound of a given category.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐   ┌───────────────┐   ┌──────────────────┐
//! │   Workbooks    │──▶│ RecordSource  │──▶│  Catalog (core)  │
//! │ master+samples │   │ typed records │   │ formula → files  │
//! └────────────────┘   └───────────────┘   │ category → forms │
//!                                          └────────┬─────────┘
//!                            ┌──────────────────────┤
//!                            ▼                      ▼
//!                       ┌──────────┐          ┌──────────┐
//!                       │   CLI    │          │   HTTP   │
//!                       │ (cfind)  │          │ /search  │
//!                       └──────────┘          └──────────┘
//! ```
//!
//! The catalog is built once at startup and never changes afterwards.
//! Normalization, the index builder, and the query engine live in the
//! `compound-finder-core` crate; this crate adds configuration, the xlsx
//! reader, and the CLI and HTTP surfaces.
//!
//! ## Quick Start
//!
//! ```bash
//! cfind sources                          # check the configured workbooks
//! cfind stats                            # build the catalog and show counts
//! cfind search "C6H12O6"                 # files listing a compound
//! cfind search "amino acids" --type category
//! cfind serve                            # start the HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`xlsx`] | Minimal `.xlsx` reader addressing cells by column letter |
//! | [`sources`] | Workbook-backed `RecordSource` and source health listing |
//! | [`catalog`] | One-time catalog build with logging |
//! | [`search`] | One-shot CLI lookups |
//! | [`stats`] | Catalog statistics |
//! | [`server`] | HTTP search server |

pub mod catalog;
pub mod config;
pub mod search;
pub mod server;
pub mod sources;
pub mod stats;
pub mod xlsx;
