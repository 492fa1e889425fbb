//! Data model shared by the report engine, the rendering pipeline and the
//! HTTP layer.
//!
//! - [`CellValue`] / [`ValueKind`]: loosely-typed cell and parameter values
//! - [`Dataset`] / [`DatasetBuilder`]: tabular data with first-row schema inference
//! - [`ParameterSlot`] / [`DataRequirement`]: what a template declares
//! - [`ConnectionInfo`]: database credentials for self-supplying templates
//! - [`ExportFormat`]: output encodings and their content types

pub mod connection;
pub mod dataset;
pub mod format;
pub mod template;
pub mod value;

pub use connection::{ConnectionInfo, ConnectionStringError};
pub use dataset::{Column, Dataset, DatasetBuilder, DatasetCollection, Record};
pub use format::ExportFormat;
pub use template::{DataRequirement, ParameterKind, ParameterSlot};
pub use value::{parse_date_text, parse_numeric_text, CellValue, ValueKind, DATE_TEXT_FORMAT};
