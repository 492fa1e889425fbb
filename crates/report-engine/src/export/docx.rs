//! Word export
//!
//! Each line of the laid-out report becomes a paragraph; lines with tab
//! separated cells become table rows. Pages are separated by page breaks.

use std::io::Cursor;

use docx_rs::*;

use super::text::PageText;
use crate::compiler::EngineError;

/// 10pt, in half-points
const BODY_SIZE: usize = 20;

pub fn write_docx(pages: &[PageText]) -> Result<Vec<u8>, EngineError> {
    let mut docx = Docx::new();

    for (index, page) in pages.iter().enumerate() {
        if index > 0 {
            docx = docx.add_paragraph(
                Paragraph::new().add_run(Run::new().add_break(BreakType::Page)),
            );
        }

        let mut table_rows: Vec<TableRow> = Vec::new();
        for line in &page.lines {
            if line.contains('\t') {
                let cells = line
                    .split('\t')
                    .map(|cell| {
                        TableCell::new().add_paragraph(
                            Paragraph::new().add_run(Run::new().add_text(cell).size(BODY_SIZE)),
                        )
                    })
                    .collect();
                table_rows.push(TableRow::new(cells));
                continue;
            }

            if !table_rows.is_empty() {
                docx = docx.add_table(Table::new(std::mem::take(&mut table_rows)));
            }
            docx = docx.add_paragraph(
                Paragraph::new().add_run(Run::new().add_text(line).size(BODY_SIZE)),
            );
        }
        if !table_rows.is_empty() {
            docx = docx.add_table(Table::new(table_rows));
        }
    }

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| EngineError::Export(format!("Failed to pack DOCX: {}", e)))?;

    Ok(buf.into_inner())
}
