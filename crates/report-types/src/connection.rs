//! Database credentials applied to self-supplying templates

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStringError {
    #[error("Malformed connection string segment: '{0}'")]
    MalformedSegment(String),

    #[error("Connection string is missing '{0}'")]
    MissingKey(&'static str),
}

/// Server, database and login applied uniformly to every table a template
/// declares, including tables inside sub-templates.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub server: String,
    pub database: String,
    pub user_id: String,
    pub password: String,
}

impl ConnectionInfo {
    pub fn new(
        server: impl Into<String>,
        database: impl Into<String>,
        user_id: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            database: database.into(),
            user_id: user_id.into(),
            password: password.into(),
        }
    }

    /// Split `server` into host and optional port (`host,port` or `host:port`)
    pub fn host_and_port(&self) -> (&str, Option<u16>) {
        let server = self.server.trim();
        for separator in [',', ':'] {
            if let Some((host, port)) = server.rsplit_once(separator) {
                if let Ok(port) = port.trim().parse() {
                    return (host.trim(), Some(port));
                }
            }
        }
        (server, None)
    }
}

impl fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("server", &self.server)
            .field("database", &self.database)
            .field("user_id", &self.user_id)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl FromStr for ConnectionInfo {
    type Err = ConnectionStringError;

    /// Parse an ADO-style `key=value;` connection string
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut server = None;
        let mut database = None;
        let mut user_id = None;
        let mut password = None;

        for segment in s.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| ConnectionStringError::MalformedSegment(segment.to_string()))?;
            let value = value.trim().to_string();

            match key.trim().to_lowercase().as_str() {
                "server" | "data source" | "address" | "addr" | "host" => server = Some(value),
                "database" | "initial catalog" => database = Some(value),
                "user id" | "uid" | "user" | "username" => user_id = Some(value),
                "password" | "pwd" => password = Some(value),
                // Driver options (timeouts, encryption, ...) are not part of the binding
                _ => {}
            }
        }

        Ok(Self {
            server: server.ok_or(ConnectionStringError::MissingKey("Server"))?,
            database: database.ok_or(ConnectionStringError::MissingKey("Database"))?,
            user_id: user_id.unwrap_or_default(),
            password: password.unwrap_or_default(),
        })
    }
}
