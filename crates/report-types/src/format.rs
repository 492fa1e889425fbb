//! Export format handling

use serde::{Deserialize, Serialize};

/// Output encoding for an exported report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Pdf,
    /// Legacy spreadsheet
    Excel,
    ExcelWorkbook,
    Word,
    RichText,
    Csv,
    Xml,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 7] = [
        ExportFormat::Pdf,
        ExportFormat::Excel,
        ExportFormat::ExcelWorkbook,
        ExportFormat::Word,
        ExportFormat::RichText,
        ExportFormat::Csv,
        ExportFormat::Xml,
    ];

    /// Resolve a caller-supplied format name.
    ///
    /// Case-insensitive and total: unrecognised or absent names resolve to PDF.
    pub fn resolve(name: Option<&str>) -> Self {
        match name.map(|n| n.trim().to_uppercase()).as_deref() {
            Some("PDF") => ExportFormat::Pdf,
            Some("EXCEL") | Some("XLS") => ExportFormat::Excel,
            Some("XLSX") => ExportFormat::ExcelWorkbook,
            Some("WORD") | Some("DOC") => ExportFormat::Word,
            Some("RTF") => ExportFormat::RichText,
            Some("CSV") => ExportFormat::Csv,
            Some("XML") => ExportFormat::Xml,
            _ => ExportFormat::Pdf,
        }
    }

    /// Get the MIME type for this format
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Excel | ExportFormat::ExcelWorkbook => "application/vnd.ms-excel",
            ExportFormat::Word => "application/msword",
            ExportFormat::RichText => "application/rtf",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xml => "application/xml",
        }
    }

    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "xls",
            ExportFormat::ExcelWorkbook => "xlsx",
            ExportFormat::Word => "docx",
            ExportFormat::RichText => "rtf",
            ExportFormat::Csv => "csv",
            ExportFormat::Xml => "xml",
        }
    }

    /// True for formats produced from the laid-out document rather than the
    /// bound tables
    pub fn is_layout(&self) -> bool {
        matches!(
            self,
            ExportFormat::Pdf | ExportFormat::Word | ExportFormat::RichText
        )
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Pdf => write!(f, "PDF"),
            ExportFormat::Excel => write!(f, "Excel"),
            ExportFormat::ExcelWorkbook => write!(f, "ExcelWorkbook"),
            ExportFormat::Word => write!(f, "Word"),
            ExportFormat::RichText => write!(f, "RTF"),
            ExportFormat::Csv => write!(f, "CSV"),
            ExportFormat::Xml => write!(f, "XML"),
        }
    }
}

impl From<&str> for ExportFormat {
    fn from(s: &str) -> Self {
        ExportFormat::resolve(Some(s))
    }
}
