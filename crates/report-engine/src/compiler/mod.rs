//! Typst compilation of report layouts and conversion of bound data into
//! Typst values

pub mod errors;
pub mod inputs;
pub mod render;

pub use errors::{CompileError, EngineError, ErrorSeverity, ParameterError};
pub use inputs::{cell_to_value, dataset_to_value, ReportInputs, SubreportInputs};
pub use render::{compile_layout, validate_syntax};
