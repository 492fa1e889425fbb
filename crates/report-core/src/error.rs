//! Error taxonomy of the rendering pipeline

use report_engine::{EngineError, ParameterError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    /// Missing or invalid request fields
    #[error("{0}")]
    RequestValidation(String),

    #[error("Cannot load report template: {0}")]
    TemplateLoad(#[source] EngineError),

    #[error("Data binding failed: {0}")]
    DataBinding(String),

    #[error("Cannot apply parameter '{name}': {source}")]
    ParameterApplication {
        name: String,
        #[source]
        source: ParameterError,
    },

    #[error(transparent)]
    Export(EngineError),
}

impl ReportError {
    /// True for errors caused by the caller's request rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(self, ReportError::RequestValidation(_))
    }
}

/// Classifies engine failures by what went wrong
impl From<EngineError> for ReportError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::TemplateNotFound(_)
            | EngineError::TemplateIo { .. }
            | EngineError::TemplateParse { .. } => ReportError::TemplateLoad(err),
            EngineError::UnboundTable(_) | EngineError::Binding(_) | EngineError::Source(_) => {
                ReportError::DataBinding(err.to_string())
            }
            EngineError::Compile(_) | EngineError::Export(_) => ReportError::Export(err),
        }
    }
}
