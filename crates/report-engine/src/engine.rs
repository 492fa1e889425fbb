//! The capability interface every rendering engine provides
//!
//! A document goes through `load → bind → set parameters → export`.
//! `export` consumes the document; dropping it at any earlier point
//! releases it as well.

use std::path::Path;

use report_types::{
    CellValue, ConnectionInfo, DataRequirement, Dataset, DatasetCollection, ExportFormat,
    ParameterSlot,
};

use crate::compiler::{EngineError, ParameterError};

/// Loads templates into documents
pub trait ReportEngine: Send + Sync {
    type Document: ReportDocument;

    /// Load the template at `path`
    fn load(&self, path: &Path) -> Result<Self::Document, EngineError>;
}

/// A loaded template and its bound state
pub trait ReportDocument {
    /// Template name (file stem)
    fn name(&self) -> &str;

    /// Tables the template and its sub-templates expect
    fn data_requirements(&self) -> &[DataRequirement];

    /// Parameters the template and its sub-templates declare
    fn parameter_slots(&self) -> &[ParameterSlot];

    /// Bind a declared table to a live database connection
    fn bind_connection(
        &mut self,
        requirement: &DataRequirement,
        connection: &ConnectionInfo,
    ) -> Result<(), EngineError>;

    /// Bind a dataset under a data source name
    fn bind_dataset(&mut self, name: &str, dataset: Dataset) -> Result<(), EngineError>;

    /// Bind every table of a collection under its own name
    fn bind_collection(&mut self, collection: DatasetCollection) -> Result<(), EngineError> {
        for dataset in collection {
            let name = dataset.name().to_string();
            self.bind_dataset(&name, dataset)?;
        }
        Ok(())
    }

    /// Apply a value to a declared parameter
    fn set_parameter(&mut self, name: &str, value: &CellValue) -> Result<(), ParameterError>;

    /// Install a record-selection formula, passed to the engine verbatim
    fn set_record_selection(&mut self, formula: &str);

    /// Produce the document in the given format
    fn export(self, format: ExportFormat) -> Result<Vec<u8>, EngineError>;
}
