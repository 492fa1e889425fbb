//! Tabular datasets bound to report templates
//!
//! A [`Dataset`] is a named, ordered list of columns plus rows of
//! [`CellValue`]s aligned to those columns. Row collections coming from
//! callers are materialised through [`DatasetBuilder`], which fixes the
//! column set and kinds from the first row and never coerces afterwards.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value::{CellValue, ValueKind};

/// A caller-supplied row: column name to JSON value, in caller order
pub type Record = serde_json::Map<String, serde_json::Value>;

/// A named column and the kind inferred for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ValueKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// An ordered set of columns and rows
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    name: String,
    columns: Vec<Column>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    /// Empty dataset: zero columns, zero rows
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Build from explicit columns and positional rows.
    ///
    /// Short rows are padded with nulls, long rows are truncated.
    pub fn from_parts(
        name: impl Into<String>,
        columns: Vec<Column>,
        rows: Vec<Vec<CellValue>>,
    ) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Null);
                row
            })
            .collect();

        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Materialise a row collection (see [`DatasetBuilder`])
    pub fn from_records(records: &[Record]) -> Self {
        let mut builder = DatasetBuilder::new();
        for record in records {
            builder.push_json_record(record);
        }
        builder.build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Same data under another table name
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.set_name(name);
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value at `row` in the named column
    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(index))
    }

    /// Rows as (column name, value) pairs in column order
    pub fn records(&self) -> impl Iterator<Item = Vec<(&str, &CellValue)>> + '_ {
        self.rows.iter().map(move |row| {
            self.columns
                .iter()
                .zip(row.iter())
                .map(|(column, value)| (column.name.as_str(), value))
                .collect()
        })
    }
}

/// Incrementally materialises rows into a [`Dataset`].
///
/// The first record defines the columns (in its key order) and their kinds;
/// a null in the first record infers a text column. Later records are carried
/// as-is: keys missing from a record become null, keys unknown to the
/// schema are dropped, and values are never coerced to the column kind.
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    name: String,
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<CellValue>>,
    schema_fixed: bool,
    dropped_values: usize,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append one row
    pub fn push_record<I, K>(&mut self, record: I)
    where
        I: IntoIterator<Item = (K, CellValue)>,
        K: Into<String>,
    {
        if !self.schema_fixed {
            self.define_schema(record);
            return;
        }

        let mut row = vec![CellValue::Null; self.columns.len()];
        for (key, value) in record {
            let key = key.into();
            match self.index.get(&key) {
                Some(&i) => row[i] = value,
                None => self.dropped_values += 1,
            }
        }
        self.rows.push(row);
    }

    /// Append one caller JSON row
    pub fn push_json_record(&mut self, record: &Record) {
        self.push_record(
            record
                .iter()
                .map(|(key, value)| (key.clone(), CellValue::from_json(value))),
        );
    }

    /// Number of values dropped because their key was not in the first row
    pub fn dropped_values(&self) -> usize {
        self.dropped_values
    }

    pub fn build(self) -> Dataset {
        Dataset {
            name: self.name,
            columns: self.columns,
            rows: self.rows,
        }
    }

    fn define_schema<I, K>(&mut self, record: I)
    where
        I: IntoIterator<Item = (K, CellValue)>,
        K: Into<String>,
    {
        let mut row = Vec::new();
        for (key, value) in record {
            let key = key.into();
            if let Some(&i) = self.index.get(&key) {
                row[i] = value;
                continue;
            }
            let kind = value.kind().unwrap_or(ValueKind::Text);
            self.index.insert(key.clone(), self.columns.len());
            self.columns.push(Column::new(key, kind));
            row.push(value);
        }
        self.rows.push(row);
        self.schema_fixed = true;
    }
}

/// A named collection of tables bound to a template in one call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetCollection {
    tables: Vec<Dataset>,
}

impl DatasetCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table under `name`, replacing any table already using that name.
    ///
    /// The table is renamed to `name` regardless of what it was called before.
    pub fn insert(&mut self, name: impl Into<String>, dataset: Dataset) {
        let dataset = dataset.renamed(name);
        match self.tables.iter_mut().find(|t| t.name() == dataset.name()) {
            Some(existing) => *existing = dataset,
            None => self.tables.push(dataset),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Dataset> {
        self.tables.iter().find(|t| t.name() == name)
    }

    pub fn tables(&self) -> &[Dataset] {
        &self.tables
    }

    pub fn names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl IntoIterator for DatasetCollection {
    type Item = Dataset;
    type IntoIter = std::vec::IntoIter<Dataset>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Dataset)> for DatasetCollection {
    fn from_iter<T: IntoIterator<Item = (K, Dataset)>>(iter: T) -> Self {
        let mut collection = DatasetCollection::new();
        for (name, dataset) in iter {
            collection.insert(name, dataset);
        }
        collection
    }
}
