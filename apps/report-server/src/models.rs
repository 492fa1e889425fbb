//! Request bodies of the generate endpoints
//!
//! Field names are accepted in camelCase and in the PascalCase older
//! clients send.

use report_core::{ExportRequest, ParameterSet};
use report_types::{CellValue, Column, Dataset, DatasetBuilder, ExportFormat, Record, ValueKind};
use serde::Deserialize;

use crate::error::ServerError;

pub const DEFAULT_DATA_SOURCE_NAME: &str = "MainDataSource";

/// Fields shared by both generate endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFields {
    #[serde(default, alias = "ReportPath")]
    pub report_path: Option<String>,

    #[serde(default, alias = "ReportFileName")]
    pub report_file_name: Option<String>,

    #[serde(default, alias = "ExportFilename", alias = "exportFileName")]
    pub export_filename: Option<String>,

    /// PDF, Excel, XLSX, Word, RTF, CSV or XML; anything else is PDF
    #[serde(default, alias = "ExportFormat")]
    pub export_format: Option<String>,

    #[serde(default, alias = "Parameters")]
    pub parameters: Option<serde_json::Map<String, serde_json::Value>>,

    #[serde(default, alias = "DataSourceName")]
    pub data_source_name: Option<String>,
}

impl ReportFields {
    /// Check the required fields and build the exporter request
    pub fn to_export_request(&self) -> Result<ExportRequest, ServerError> {
        let (path, file) = match (
            non_empty(self.report_path.as_deref()),
            non_empty(self.report_file_name.as_deref()),
        ) {
            (Some(path), Some(file)) => (path, file),
            _ => {
                return Err(ServerError::InvalidRequest(
                    "ReportPath and ReportFileName are required".to_string(),
                ))
            }
        };

        let format = ExportFormat::resolve(self.export_format.as_deref());
        let export_file_name = non_empty(self.export_filename.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| default_export_file_name(file, format));
        let parameters = self
            .parameters
            .as_ref()
            .map(ParameterSet::from_json)
            .unwrap_or_default();

        Ok(ExportRequest::new(path, file)
            .with_export_file_name(export_file_name)
            .with_format(format)
            .with_parameters(parameters))
    }

    pub fn data_source_name(&self) -> &str {
        non_empty(self.data_source_name.as_deref()).unwrap_or(DEFAULT_DATA_SOURCE_NAME)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `<template stem>.<format extension>`
fn default_export_file_name(template_file_name: &str, format: ExportFormat) -> String {
    let stem = template_file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(template_file_name);
    format!("{}.{}", stem, format.extension())
}

/// Body of `POST /api/Reports/GenerateWithRecordset`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsetReportRequest {
    #[serde(flatten)]
    pub report: ReportFields,

    #[serde(default, alias = "RecordsetData")]
    pub recordset_data: Option<Vec<Record>>,
}

/// Body of `POST /api/Reports/GenerateWithDataTable`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTableReportRequest {
    #[serde(flatten)]
    pub report: ReportFields,

    #[serde(default, alias = "DataTable")]
    pub data_table: Option<DataTablePayload>,
}

/// A table as callers serialise it: either a plain array of row objects or
/// explicit columns with positional rows
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DataTablePayload {
    Rows(Vec<Record>),
    Structured(StructuredTable),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredTable {
    #[serde(default, alias = "TableName", alias = "tableName")]
    pub name: Option<String>,

    #[serde(alias = "Columns")]
    pub columns: Vec<ColumnPayload>,

    #[serde(default, alias = "Rows")]
    pub rows: Vec<Vec<CellValue>>,
}

#[derive(Debug, Deserialize)]
pub struct ColumnPayload {
    #[serde(alias = "Name", alias = "ColumnName", alias = "columnName")]
    pub name: String,

    /// Declared kind; inferred from the first row when absent
    #[serde(default, alias = "Kind", alias = "dataType", alias = "DataType")]
    pub kind: Option<ValueKind>,
}

impl DataTablePayload {
    pub fn into_dataset(self) -> Dataset {
        match self {
            DataTablePayload::Rows(records) => {
                let mut builder = DatasetBuilder::new();
                for record in &records {
                    builder.push_json_record(record);
                }
                builder.build()
            }
            DataTablePayload::Structured(table) => {
                let first_row = table.rows.first();
                let columns = table
                    .columns
                    .into_iter()
                    .enumerate()
                    .map(|(i, column)| {
                        let kind = column
                            .kind
                            .or_else(|| first_row.and_then(|row| row.get(i)?.kind()))
                            .unwrap_or(ValueKind::Text);
                        Column::new(column.name, kind)
                    })
                    .collect();
                Dataset::from_parts(table.name.unwrap_or_default(), columns, table.rows)
            }
        }
    }
}
