//! The export step shared by the Renderer and the Exporter

use report_engine::ReportDocument;
use report_types::ExportFormat;

use crate::error::ReportError;

/// A fully materialised report ready to be sent to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReport {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub format: ExportFormat,
}

impl RenderedReport {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// Export a document, consuming it
pub fn export_report<D: ReportDocument>(
    document: D,
    format: ExportFormat,
    file_name: &str,
) -> Result<RenderedReport, ReportError> {
    let report = document.name().to_string();
    let bytes = document.export(format)?;

    tracing::info!(
        report = %report,
        format = %format,
        file_name = %file_name,
        bytes = bytes.len(),
        "Report rendered"
    );

    Ok(RenderedReport {
        bytes,
        file_name: file_name.to_string(),
        format,
    })
}
