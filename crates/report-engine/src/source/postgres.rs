//! PostgreSQL table source
//!
//! Opens one connection per fetch; pooling is left to the driver's callers.
//! Must be called from a blocking context: inside a Tokio runtime it blocks
//! on the current handle, otherwise it drives a private current-thread
//! runtime.

use std::future::Future;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use report_types::{CellValue, Column, ConnectionInfo, DataRequirement, Dataset, ValueKind};
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::{Column as _, Connection, Executor, Row, Statement, TypeInfo, ValueRef};

use super::TableSource;
use crate::compiler::EngineError;

const DEFAULT_PORT: u16 = 5432;

/// Fetches tables from PostgreSQL with sqlx
#[derive(Debug, Default, Clone, Copy)]
pub struct PgTableSource;

impl TableSource for PgTableSource {
    fn fetch(
        &self,
        connection: &ConnectionInfo,
        requirements: &[&DataRequirement],
    ) -> Result<Vec<Dataset>, EngineError> {
        let options = connect_options(connection);
        block_on(fetch_tables(options, requirements))?
    }
}

fn connect_options(connection: &ConnectionInfo) -> PgConnectOptions {
    let (host, port) = connection.host_and_port();
    let mut options = PgConnectOptions::new()
        .host(host)
        .port(port.unwrap_or(DEFAULT_PORT))
        .database(&connection.database);

    if !connection.user_id.is_empty() {
        options = options.username(&connection.user_id);
    }
    if !connection.password.is_empty() {
        options = options.password(&connection.password);
    }
    options
}

fn block_on<F: Future>(future: F) -> Result<F::Output, EngineError> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Ok(handle.block_on(future)),
        Err(_) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| EngineError::Source(format!("Cannot start runtime: {}", e)))?;
            Ok(runtime.block_on(future))
        }
    }
}

async fn fetch_tables(
    options: PgConnectOptions,
    requirements: &[&DataRequirement],
) -> Result<Vec<Dataset>, EngineError> {
    let mut conn = PgConnection::connect_with(&options)
        .await
        .map_err(|e| EngineError::Source(format!("Cannot connect: {}", e)))?;

    let mut tables = Vec::with_capacity(requirements.len());
    for requirement in requirements {
        let query = requirement.effective_query();
        tracing::debug!(table = %requirement.table, query = %query, "Fetching table");

        let table = fetch_table(&mut conn, &requirement.table, &query)
            .await
            .map_err(|e| {
                EngineError::Source(format!("Query for '{}' failed: {}", requirement.table, e))
            })?;
        tracing::debug!(table = %requirement.table, rows = table.row_count(), "Fetched table");
        tables.push(table);
    }

    if let Err(e) = conn.close().await {
        tracing::debug!("Error closing connection: {}", e);
    }
    Ok(tables)
}

async fn fetch_table(
    conn: &mut PgConnection,
    name: &str,
    query: &str,
) -> Result<Dataset, sqlx::Error> {
    let statement = (&mut *conn).prepare(query).await?;
    let described: Vec<(String, Decoder)> = statement
        .columns()
        .iter()
        .map(|c| (c.name().to_string(), Decoder::from_type_name(c.type_info().name())))
        .collect();

    // Types without a string decoding are read through their text form
    let projected = text_projection(query, &described);
    let statement = match projected.as_deref() {
        Some(projected) => {
            tracing::debug!(table = %name, "Casting columns to text");
            (&mut *conn).prepare(projected).await?
        }
        None => statement,
    };

    let columns: Vec<Column> = described
        .iter()
        .map(|(column, decoder)| Column::new(column.as_str(), decoder.kind()))
        .collect();

    let rows = statement.query().fetch_all(&mut *conn).await?;
    let rows = rows
        .iter()
        .map(|row| {
            described
                .iter()
                .enumerate()
                .map(|(index, (_, decoder))| decoder.decode(row, index))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Dataset::from_parts(name, columns, rows))
}

/// `query` wrapped so every column needing a cast is selected as `::text`,
/// or `None` when no column does
fn text_projection(query: &str, columns: &[(String, Decoder)]) -> Option<String> {
    if !columns.iter().any(|(_, d)| *d == Decoder::Cast) {
        return None;
    }
    let projection: Vec<String> = columns
        .iter()
        .map(|(name, decoder)| {
            let quoted = format!("\"{}\"", name.replace('"', "\"\""));
            match decoder {
                Decoder::Cast => format!("{}::text AS {}", quoted, quoted),
                _ => quoted,
            }
        })
        .collect();
    Some(format!(
        "SELECT {} FROM ({}) AS report_source",
        projection.join(", "),
        query.trim().trim_end_matches(';')
    ))
}

/// How a column's values are read, by database type name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decoder {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Numeric,
    Date,
    Timestamp,
    TimestampTz,
    Text,
    /// Any other type, selected as `::text`
    Cast,
}

impl Decoder {
    fn from_type_name(name: &str) -> Self {
        match name {
            "BOOL" => Decoder::Bool,
            "INT2" => Decoder::Int2,
            "INT4" => Decoder::Int4,
            "INT8" => Decoder::Int8,
            "FLOAT4" => Decoder::Float4,
            "FLOAT8" => Decoder::Float8,
            "NUMERIC" => Decoder::Numeric,
            "DATE" => Decoder::Date,
            "TIMESTAMP" => Decoder::Timestamp,
            "TIMESTAMPTZ" => Decoder::TimestampTz,
            "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" | "CITEXT" => Decoder::Text,
            _ => Decoder::Cast,
        }
    }

    fn kind(self) -> ValueKind {
        match self {
            Decoder::Bool => ValueKind::Boolean,
            Decoder::Int2 | Decoder::Int4 | Decoder::Int8 => ValueKind::Integer,
            Decoder::Float4 | Decoder::Float8 => ValueKind::Number,
            Decoder::Numeric => ValueKind::Decimal,
            Decoder::Date | Decoder::Timestamp | Decoder::TimestampTz => ValueKind::Date,
            Decoder::Text | Decoder::Cast => ValueKind::Text,
        }
    }

    fn decode(self, row: &PgRow, index: usize) -> Result<CellValue, sqlx::Error> {
        if row.try_get_raw(index)?.is_null() {
            return Ok(CellValue::Null);
        }

        let value = match self {
            Decoder::Bool => CellValue::Boolean(row.try_get::<bool, _>(index)?),
            Decoder::Int2 => CellValue::Integer(row.try_get::<i16, _>(index)?.into()),
            Decoder::Int4 => CellValue::Integer(row.try_get::<i32, _>(index)?.into()),
            Decoder::Int8 => CellValue::Integer(row.try_get::<i64, _>(index)?),
            Decoder::Float4 => CellValue::Number(row.try_get::<f32, _>(index)?.into()),
            Decoder::Float8 => CellValue::Number(row.try_get::<f64, _>(index)?),
            Decoder::Numeric => CellValue::Decimal(row.try_get::<Decimal, _>(index)?),
            Decoder::Date => CellValue::Date(
                row.try_get::<NaiveDate, _>(index)?
                    .and_time(chrono::NaiveTime::MIN),
            ),
            Decoder::Timestamp => CellValue::Date(row.try_get::<NaiveDateTime, _>(index)?),
            Decoder::TimestampTz => {
                CellValue::Date(row.try_get::<DateTime<Utc>, _>(index)?.naive_utc())
            }
            Decoder::Text | Decoder::Cast => CellValue::Text(row.try_get::<String, _>(index)?),
        };
        Ok(value)
    }
}
