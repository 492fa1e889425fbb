//! Spreadsheet export: one worksheet per bound table

use report_types::{CellValue, Dataset, DATE_TEXT_FORMAT};
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::compiler::EngineError;

/// Excel's sheet name limit
const MAX_SHEET_NAME: usize = 31;

pub fn write_xlsx(report_name: &str, tables: &[&Dataset]) -> Result<Vec<u8>, EngineError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let mut used_names: Vec<String> = Vec::new();

    if tables.is_empty() {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(sheet_name(report_name, &mut used_names))
            .map_err(xlsx_error)?;
    }

    for table in tables {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(sheet_name(table.name(), &mut used_names))
            .map_err(xlsx_error)?;
        write_table(worksheet, table, &header_format).map_err(xlsx_error)?;
        worksheet.autofit();
    }

    workbook.save_to_buffer().map_err(xlsx_error)
}

fn write_table(
    worksheet: &mut Worksheet,
    table: &Dataset,
    header_format: &Format,
) -> Result<(), XlsxError> {
    for (col, column) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, &column.name, header_format)?;
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        let excel_row = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let col = col_idx as u16;
            match cell {
                CellValue::Null => {}
                CellValue::Text(s) => {
                    worksheet.write_string(excel_row, col, s)?;
                }
                CellValue::Integer(i) => {
                    worksheet.write_number(excel_row, col, *i as f64)?;
                }
                CellValue::Number(f) => {
                    worksheet.write_number(excel_row, col, *f)?;
                }
                CellValue::Decimal(d) => match d.to_f64() {
                    Some(f) => {
                        worksheet.write_number(excel_row, col, f)?;
                    }
                    None => {
                        worksheet.write_string(excel_row, col, d.to_string())?;
                    }
                },
                CellValue::Date(d) => {
                    worksheet.write_string(
                        excel_row,
                        col,
                        d.format(DATE_TEXT_FORMAT).to_string(),
                    )?;
                }
                CellValue::Boolean(b) => {
                    worksheet.write_boolean(excel_row, col, *b)?;
                }
            }
        }
    }
    Ok(())
}

/// A valid, unique worksheet name derived from a table name
fn sheet_name(name: &str, used: &mut Vec<String>) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches('\'').trim();
    let base: String = if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        cleaned.chars().take(MAX_SHEET_NAME).collect()
    };

    let mut candidate = base.clone();
    let mut suffix = 2;
    while used.iter().any(|u| u.eq_ignore_ascii_case(&candidate)) {
        let tail = format!(" ({})", suffix);
        let keep = MAX_SHEET_NAME.saturating_sub(tail.chars().count());
        candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), tail);
        suffix += 1;
    }
    used.push(candidate.clone());
    candidate
}

fn xlsx_error(e: XlsxError) -> EngineError {
    EngineError::Export(format!("Spreadsheet export failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_types::{Column, ValueKind};

    fn orders() -> Dataset {
        Dataset::from_parts(
            "Orders",
            vec![
                Column::new("OrderId", ValueKind::Integer),
                Column::new("Product", ValueKind::Text),
                Column::new("Shipped", ValueKind::Boolean),
            ],
            vec![
                vec![CellValue::Integer(1001), CellValue::from("Widget A"), CellValue::Boolean(true)],
                vec![CellValue::Integer(1002), CellValue::Null, CellValue::Boolean(false)],
            ],
        )
    }

    #[test]
    fn test_workbook_is_zip() {
        let orders = orders();
        let bytes = write_xlsx("Sales", &[&orders]).unwrap();
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn test_no_tables_still_produces_workbook() {
        let bytes = write_xlsx("Sales", &[]).unwrap();
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn test_sheet_names_sanitized_and_unique() {
        let mut used = Vec::new();
        assert_eq!(sheet_name("Q1/Q2 [draft]", &mut used), "Q1_Q2 _draft_");
        assert_eq!(sheet_name("Orders", &mut used), "Orders");
        assert_eq!(sheet_name("orders", &mut used), "orders (2)");
        assert_eq!(sheet_name("", &mut used), "Sheet");

        let long = "A".repeat(40);
        assert_eq!(sheet_name(&long, &mut used).chars().count(), MAX_SHEET_NAME);
    }
}
