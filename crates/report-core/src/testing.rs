//! In-memory engine recording every call made on its documents

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use report_engine::{EngineError, ParameterError, ReportDocument, ReportEngine};
use report_types::{
    CellValue, ConnectionInfo, DataRequirement, Dataset, ExportFormat, ParameterSlot,
};

/// What happened to a fake document, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Loaded(String),
    Connection { table: String, database: String },
    Dataset { name: String, table: String, rows: usize },
    Parameter(String, CellValue),
    Selection(String),
    Exported(ExportFormat),
    Released(String),
}

/// Declared model of a fake template
#[derive(Debug, Clone, Default)]
pub struct FakeTemplate {
    pub requirements: Vec<DataRequirement>,
    pub parameters: Vec<ParameterSlot>,
    pub fail_export: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FakeEngine {
    templates: HashMap<PathBuf, FakeTemplate>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, path: impl Into<PathBuf>, template: FakeTemplate) -> Self {
        self.templates.insert(path.into(), template);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl ReportEngine for FakeEngine {
    type Document = FakeDocument;

    fn load(&self, path: &Path) -> Result<FakeDocument, EngineError> {
        let template = self
            .templates
            .get(path)
            .cloned()
            .ok_or_else(|| EngineError::TemplateNotFound(path.to_path_buf()))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.calls.lock().unwrap().push(Call::Loaded(name.clone()));
        Ok(FakeDocument {
            name,
            template,
            calls: Arc::clone(&self.calls),
        })
    }
}

#[derive(Debug)]
pub struct FakeDocument {
    name: String,
    template: FakeTemplate,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl FakeDocument {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ReportDocument for FakeDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn data_requirements(&self) -> &[DataRequirement] {
        &self.template.requirements
    }

    fn parameter_slots(&self) -> &[ParameterSlot] {
        &self.template.parameters
    }

    fn bind_connection(
        &mut self,
        requirement: &DataRequirement,
        connection: &ConnectionInfo,
    ) -> Result<(), EngineError> {
        self.record(Call::Connection {
            table: requirement.table.clone(),
            database: connection.database.clone(),
        });
        Ok(())
    }

    fn bind_dataset(&mut self, name: &str, dataset: Dataset) -> Result<(), EngineError> {
        self.record(Call::Dataset {
            name: name.to_string(),
            table: dataset.name().to_string(),
            rows: dataset.row_count(),
        });
        Ok(())
    }

    fn set_parameter(&mut self, name: &str, value: &CellValue) -> Result<(), ParameterError> {
        let slot = self
            .template
            .parameters
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ParameterError::UnknownSlot(name.to_string()))?;
        let value = slot.kind.coerce(value).ok_or_else(|| ParameterError::WrongKind {
            name: name.to_string(),
            expected: slot.kind,
            found: value.kind().map(|k| k.to_string()).unwrap_or_default(),
        })?;
        self.record(Call::Parameter(name.to_string(), value));
        Ok(())
    }

    fn set_record_selection(&mut self, formula: &str) {
        self.record(Call::Selection(formula.to_string()));
    }

    fn export(self, format: ExportFormat) -> Result<Vec<u8>, EngineError> {
        if self.template.fail_export {
            return Err(EngineError::Export("renderer crashed".to_string()));
        }
        self.record(Call::Exported(format));
        Ok(format!("{}:{}", self.name, format).into_bytes())
    }
}

impl Drop for FakeDocument {
    fn drop(&mut self) {
        let call = Call::Released(self.name.clone());
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}
