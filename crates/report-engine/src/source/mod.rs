//! Table sources for connection-bound data requirements

#[cfg(feature = "postgres")]
pub mod postgres;

use report_types::{ConnectionInfo, DataRequirement, Dataset};

use crate::compiler::EngineError;

#[cfg(feature = "postgres")]
pub use postgres::PgTableSource;

/// Fetches the rows of connection-bound tables at export time.
///
/// One call per connection per export. Implementations return one dataset
/// per requirement, in order, each named after its requirement's table.
pub trait TableSource: Send + Sync {
    fn fetch(
        &self,
        connection: &ConnectionInfo,
        requirements: &[&DataRequirement],
    ) -> Result<Vec<Dataset>, EngineError>;
}

/// A source for deployments without a database driver
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTableSource;

impl TableSource for NoTableSource {
    fn fetch(
        &self,
        connection: &ConnectionInfo,
        requirements: &[&DataRequirement],
    ) -> Result<Vec<Dataset>, EngineError> {
        let tables: Vec<&str> = requirements.iter().map(|r| r.table.as_str()).collect();
        Err(EngineError::Source(format!(
            "no database driver available to fetch [{}] from {}/{}",
            tables.join(", "),
            connection.server,
            connection.database
        )))
    }
}
