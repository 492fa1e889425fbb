//! Error types for template loading, binding and export

use std::path::PathBuf;

use report_types::ParameterKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A compilation diagnostic as reported by Typst
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileError {
    /// Human-readable error message
    pub message: String,
    /// Helpful hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Severity level
    pub severity: ErrorSeverity,
}

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Error,
    Warning,
}

impl CompileError {
    /// Create a new compile error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            hint: None,
            severity: ErrorSeverity::Error,
        }
    }

    /// Set a hint
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Set as warning
    pub fn as_warning(mut self) -> Self {
        self.severity = ErrorSeverity::Warning;
        self
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.hint {
            Some(hint) => write!(f, "{} (hint: {})", self.message, hint),
            None => write!(f, "{}", self.message),
        }
    }
}

fn join_errors(errors: &[CompileError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Engine-side errors
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("Cannot read template {}: {source}", .path.display())]
    TemplateIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid template {}: {message}", .path.display())]
    TemplateParse { path: PathBuf, message: String },

    #[error("Table '{0}' has no data source bound")]
    UnboundTable(String),

    #[error("Invalid binding: {0}")]
    Binding(String),

    #[error("Table source error: {0}")]
    Source(String),

    #[error("Compilation failed: {}", join_errors(.0))]
    Compile(Vec<CompileError>),

    #[error("Export failed: {0}")]
    Export(String),
}

/// Failure to apply a single parameter value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParameterError {
    #[error("Template declares no parameter named '{0}'")]
    UnknownSlot(String),

    #[error("Parameter '{name}' expects a {expected} value, got {found}")]
    WrongKind {
        name: String,
        expected: ParameterKind,
        found: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_display_joins_hints() {
        let err = EngineError::Compile(vec![
            CompileError::new("unknown variable: foo").with_hint("did you mean `for`?"),
            CompileError::new("expected expression"),
        ]);
        assert_eq!(
            err.to_string(),
            "Compilation failed: unknown variable: foo (hint: did you mean `for`?); expected expression"
        );
    }

    #[test]
    fn test_wrong_kind_message() {
        let err = ParameterError::WrongKind {
            name: "Year".to_string(),
            expected: ParameterKind::Number,
            found: "text".to_string(),
        };
        assert_eq!(err.to_string(), "Parameter 'Year' expects a number value, got text");
    }
}
