//! What a loaded template declares: data requirements and parameter slots

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::value::{parse_date_text, parse_numeric_text, CellValue};

/// Declared value kind of a parameter slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Text,
    Number,
    Date,
    Boolean,
}

impl ParameterKind {
    /// Coerce a caller value into this kind.
    ///
    /// Returns `None` when the value cannot represent the kind. Text slots
    /// accept any non-null scalar; the other kinds also accept their textual
    /// forms.
    pub fn coerce(&self, value: &CellValue) -> Option<CellValue> {
        match (self, value) {
            (_, CellValue::Null) => None,

            (ParameterKind::Text, CellValue::Text(_)) => Some(value.clone()),
            (ParameterKind::Text, other) => Some(CellValue::Text(other.to_string())),

            (ParameterKind::Number, CellValue::Integer(_))
            | (ParameterKind::Number, CellValue::Number(_))
            | (ParameterKind::Number, CellValue::Decimal(_)) => Some(value.clone()),
            (ParameterKind::Number, CellValue::Text(s)) => parse_numeric_text(s),
            (ParameterKind::Number, _) => None,

            (ParameterKind::Date, CellValue::Date(_)) => Some(value.clone()),
            (ParameterKind::Date, CellValue::Text(s)) => parse_date_text(s).map(CellValue::Date),
            (ParameterKind::Date, _) => None,

            (ParameterKind::Boolean, CellValue::Boolean(_)) => Some(value.clone()),
            (ParameterKind::Boolean, CellValue::Text(s)) => {
                match s.trim().to_ascii_lowercase().as_str() {
                    "true" => Some(CellValue::Boolean(true)),
                    "false" => Some(CellValue::Boolean(false)),
                    _ => None,
                }
            }
            (ParameterKind::Boolean, _) => None,
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterKind::Text => write!(f, "text"),
            ParameterKind::Number => write!(f, "number"),
            ParameterKind::Date => write!(f, "date"),
            ParameterKind::Boolean => write!(f, "boolean"),
        }
    }
}

impl FromStr for ParameterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "string" => Ok(ParameterKind::Text),
            "number" => Ok(ParameterKind::Number),
            "date" | "datetime" => Ok(ParameterKind::Date),
            "boolean" | "bool" => Ok(ParameterKind::Boolean),
            other => Err(format!("Unknown parameter kind: {}", other)),
        }
    }
}

/// A named, typed input the template substitutes at render time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSlot {
    pub name: String,
    pub kind: ParameterKind,
    /// Owning sub-template; empty or absent for free top-level slots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl ParameterSlot {
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            owner: None,
        }
    }

    pub fn linked(name: impl Into<String>, kind: ParameterKind, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            owner: Some(owner.into()),
        }
    }

    /// True when a sub-template supplies this slot at its own render time
    pub fn is_linked(&self) -> bool {
        self.owner.as_deref().is_some_and(|o| !o.is_empty())
    }
}

/// A named table the template (or one of its sub-templates) expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRequirement {
    pub table: String,
    /// Sub-template that declares the table, `None` at top level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Query run when the table is bound to a live connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl DataRequirement {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            owner: None,
            query: None,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn is_nested(&self) -> bool {
        self.owner.is_some()
    }

    /// Query used for connection bindings
    pub fn effective_query(&self) -> String {
        match &self.query {
            Some(query) => query.clone(),
            None => format!("SELECT * FROM \"{}\"", self.table.replace('"', "\"\"")),
        }
    }
}
