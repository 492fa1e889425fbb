//! Report rendering engine
//!
//! This crate provides the capability interface the rendering pipeline
//! drives ([`ReportEngine`] / [`ReportDocument`]) and a Typst-backed
//! implementation of it:
//! - Template loading (directive manifest + Typst layout)
//! - Data and parameter binding through `sys.inputs`
//! - Export to PDF, Word, RTF, spreadsheet, CSV and XML
//! - Database table sources for connection-bound templates
//!
//! # Feature Flags
//!
//! - `postgres` (default): Enables [`source::PgTableSource`] (requires sqlx and tokio)

pub mod compiler;
pub mod document;
pub mod engine;
pub mod export;
pub mod source;
pub mod templates;
pub mod world;

pub use compiler::{CompileError, EngineError, ParameterError};
pub use document::{TypstDocument, TypstEngine};
pub use engine::{ReportDocument, ReportEngine};
pub use source::{NoTableSource, TableSource};
pub use world::init_font_cache;

#[cfg(feature = "postgres")]
pub use source::PgTableSource;
