//! Delimited text export of a single table

use report_types::Dataset;

use crate::compiler::EngineError;

/// Write a table as CSV with a header record.
///
/// `None` (no table bound) produces an empty body.
pub fn write_csv(table: Option<&Dataset>) -> Result<Vec<u8>, EngineError> {
    let Some(table) = table else {
        return Ok(Vec::new());
    };

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());

    writer
        .write_record(table.column_names())
        .map_err(|e| EngineError::Export(format!("Failed to write header record: {}", e)))?;

    for row in table.rows() {
        writer
            .write_record(row.iter().map(|cell| cell.to_string()))
            .map_err(|e| EngineError::Export(format!("Failed to write data record: {}", e)))?;
    }

    writer
        .into_inner()
        .map_err(|e| EngineError::Export(format!("Failed to flush CSV writer: {}", e)))
}
