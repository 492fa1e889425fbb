//! Document writers for every export format
//!
//! Layout formats (PDF, Word, RTF) are produced from the compiled Typst
//! document; tabular formats (spreadsheet, CSV, XML) from the bound tables.

pub mod delimited;
pub mod docx;
pub mod rtf;
pub mod text;
pub mod xlsx;
pub mod xml;

use report_types::ExportFormat;
use typst::model::Document;

use crate::compiler::EngineError;

pub use delimited::write_csv;
pub use docx::write_docx;
pub use rtf::write_rtf;
pub use text::{document_text, PageText};
pub use xlsx::write_xlsx;
pub use xml::write_xml;

/// Encode a compiled document in a layout format
pub fn export_layout(document: &Document, format: ExportFormat) -> Result<Vec<u8>, EngineError> {
    match format {
        ExportFormat::Word => write_docx(&document_text(document)),
        ExportFormat::RichText => Ok(write_rtf(&document_text(document))),
        _ => typst_pdf::pdf(document, &typst_pdf::PdfOptions::default()).map_err(|diagnostics| {
            let messages: Vec<String> = diagnostics.iter().map(|d| d.message.to_string()).collect();
            EngineError::Export(format!("PDF export failed: {}", messages.join("; ")))
        }),
    }
}
