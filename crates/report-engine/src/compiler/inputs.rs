//! Conversion of bound report data into `sys.inputs`

use chrono::{Datelike, Timelike};
use report_types::{CellValue, Dataset, ExportFormat};
use rust_decimal::prelude::ToPrimitive;
use typst::foundations::{Array, Datetime, Dict, Value};

/// Everything a layout can read at compile time
#[derive(Debug, Default)]
pub struct ReportInputs<'a> {
    pub name: &'a str,
    pub format: ExportFormat,
    pub params: Vec<(&'a str, &'a CellValue)>,
    pub tables: Vec<&'a Dataset>,
    pub subreports: Vec<SubreportInputs<'a>>,
}

/// Data and linked parameter values of one sub-template
#[derive(Debug, Default)]
pub struct SubreportInputs<'a> {
    pub name: &'a str,
    pub params: Vec<(&'a str, &'a CellValue)>,
    pub tables: Vec<&'a Dataset>,
}

impl ReportInputs<'_> {
    /// Build the `sys.inputs` dictionary:
    /// `report`, `params`, `data` and `subreports`
    pub fn to_dict(&self) -> Dict {
        let mut report = Dict::new();
        report.insert("name".into(), Value::Str(self.name.into()));
        report.insert(
            "format".into(),
            Value::Str(self.format.extension().into()),
        );

        let mut subreports = Dict::new();
        for sub in &self.subreports {
            let mut scope = Dict::new();
            scope.insert("params".into(), params_to_dict(&sub.params));
            scope.insert("data".into(), tables_to_dict(&sub.tables));
            subreports.insert(sub.name.into(), Value::Dict(scope));
        }

        let mut dict = Dict::new();
        dict.insert("report".into(), Value::Dict(report));
        dict.insert("params".into(), params_to_dict(&self.params));
        dict.insert("data".into(), tables_to_dict(&self.tables));
        dict.insert("subreports".into(), Value::Dict(subreports));
        dict
    }
}

fn params_to_dict(params: &[(&str, &CellValue)]) -> Value {
    let mut dict = Dict::new();
    for (name, value) in params {
        dict.insert((*name).into(), cell_to_value(value));
    }
    Value::Dict(dict)
}

fn tables_to_dict(tables: &[&Dataset]) -> Value {
    let mut dict = Dict::new();
    for table in tables {
        dict.insert(table.name().into(), dataset_to_value(table));
    }
    Value::Dict(dict)
}

/// Convert a cell to a Typst value. Decimals are passed as floats.
pub fn cell_to_value(cell: &CellValue) -> Value {
    match cell {
        CellValue::Null => Value::None,
        CellValue::Text(s) => Value::Str(s.as_str().into()),
        CellValue::Integer(i) => Value::Int(*i),
        CellValue::Number(f) => Value::Float(*f),
        CellValue::Decimal(d) => d.to_f64().map(Value::Float).unwrap_or(Value::None),
        CellValue::Date(d) => Datetime::from_ymd_hms(
            d.year(),
            d.month() as u8,
            d.day() as u8,
            d.hour() as u8,
            d.minute() as u8,
            d.second() as u8,
        )
        .map(Value::Datetime)
        .unwrap_or(Value::None),
        CellValue::Boolean(b) => Value::Bool(*b),
    }
}

/// Convert a dataset to an array of row dictionaries
pub fn dataset_to_value(dataset: &Dataset) -> Value {
    let rows: Vec<Value> = dataset
        .records()
        .map(|record| {
            let mut row = Dict::new();
            for (column, value) in record {
                row.insert(column.into(), cell_to_value(value));
            }
            Value::Dict(row)
        })
        .collect();

    Value::Array(Array::from(rows.as_slice()))
}
