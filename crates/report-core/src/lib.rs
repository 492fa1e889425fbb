//! The rendering pipeline between loosely-typed caller input and a report
//! engine.
//!
//! - [`Renderer`]: templates that pull their own data through a database
//!   connection, with parameter defaults and fail-fast parameter application
//! - [`Exporter`]: templates fed with caller tables, best-effort parameters
//!   and a caller-chosen export format
//!
//! Both consume the document on export; it is released on every exit path.

pub mod error;
pub mod exporter;
pub mod output;
pub mod parameters;
pub mod renderer;
pub mod resolver;

#[cfg(test)]
mod testing;

pub use error::ReportError;
pub use exporter::{ExportRequest, Exporter, DEFAULT_EXPORT_FILE_NAME};
pub use output::{export_report, RenderedReport};
pub use parameters::{
    apply_parameters, complete_parameters, policy_default, ApplyPolicy, ParameterSet, LETTER_HEAD,
};
pub use renderer::{RenderRequest, Renderer};
pub use resolver::{TemplateResolver, TEMPLATE_EXTENSION};
