//! Typst-backed report engine
//!
//! [`TypstEngine::load`] reads a template file, parses its directives and
//! checks the layout syntax. The resulting [`TypstDocument`] collects
//! bindings and parameter values; [`ReportDocument::export`] fetches any
//! connection-bound tables, compiles the layout and encodes the output.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use report_types::{
    CellValue, ConnectionInfo, DataRequirement, Dataset, DatasetCollection, ExportFormat,
    ParameterSlot,
};

use crate::compiler::{
    compile_layout, validate_syntax, EngineError, ParameterError, ReportInputs, SubreportInputs,
};
use crate::engine::{ReportDocument, ReportEngine};
use crate::export::{export_layout, write_csv, write_xlsx, write_xml};
use crate::source::{NoTableSource, TableSource};
use crate::templates::{render_prelude, TemplateManifest};

/// Loads Typst report templates from disk
#[derive(Clone)]
pub struct TypstEngine {
    source: Arc<dyn TableSource>,
}

impl TypstEngine {
    /// An engine without a database driver; connection-bound tables fail at
    /// export
    pub fn new() -> Self {
        Self::with_table_source(Arc::new(NoTableSource))
    }

    pub fn with_table_source(source: Arc<dyn TableSource>) -> Self {
        Self { source }
    }

    /// An engine fetching connection-bound tables from PostgreSQL
    #[cfg(feature = "postgres")]
    pub fn with_postgres() -> Self {
        Self::with_table_source(Arc::new(crate::source::PgTableSource))
    }
}

impl Default for TypstEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypstEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypstEngine").finish_non_exhaustive()
    }
}

impl ReportEngine for TypstEngine {
    type Document = TypstDocument;

    fn load(&self, path: &Path) -> Result<TypstDocument, EngineError> {
        let layout = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EngineError::TemplateNotFound(path.to_path_buf()),
            _ => EngineError::TemplateIo {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let manifest = TemplateManifest::parse(&layout).map_err(|e| EngineError::TemplateParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let syntax_errors = validate_syntax(&layout);
        if !syntax_errors.is_empty() {
            let messages: Vec<String> = syntax_errors.iter().map(|e| e.to_string()).collect();
            return Err(EngineError::TemplateParse {
                path: path.to_path_buf(),
                message: messages.join("; "),
            });
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        tracing::debug!(
            template = %path.display(),
            tables = manifest.requirements.len(),
            parameters = manifest.parameters.len(),
            "Template loaded"
        );

        Ok(TypstDocument {
            name,
            root: path.parent().map(Path::to_path_buf),
            bindings: vec![None; manifest.requirements.len()],
            values: vec![None; manifest.parameters.len()],
            layout,
            manifest,
            extra_tables: Vec::new(),
            selection: None,
            source: Arc::clone(&self.source),
        })
    }
}

#[derive(Debug, Clone)]
enum Binding {
    Connection(ConnectionInfo),
    Data(Dataset),
}

/// A loaded template with its bindings and parameter values
pub struct TypstDocument {
    name: String,
    root: Option<PathBuf>,
    layout: String,
    manifest: TemplateManifest,
    /// Index-aligned with `manifest.requirements`
    bindings: Vec<Option<Binding>>,
    /// Index-aligned with `manifest.parameters`
    values: Vec<Option<CellValue>>,
    /// Datasets bound under names the template does not declare
    extra_tables: Vec<Dataset>,
    selection: Option<String>,
    source: Arc<dyn TableSource>,
}

impl std::fmt::Debug for TypstDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypstDocument")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl TypstDocument {
    /// Index of the requirement for `name`, top-level tables first
    fn requirement_index(&self, name: &str) -> Option<usize> {
        let requirements = &self.manifest.requirements;
        let matches = |r: &DataRequirement| r.table.eq_ignore_ascii_case(name);
        requirements
            .iter()
            .position(|r| !r.is_nested() && matches(r))
            .or_else(|| requirements.iter().position(|r| r.is_nested() && matches(r)))
    }

    /// The only top-level requirement, if the template declares exactly one
    fn sole_top_level(&self) -> Option<usize> {
        let mut top_level = self
            .manifest
            .requirements
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.is_nested());
        match (top_level.next(), top_level.next()) {
            (Some((index, _)), None) => Some(index),
            _ => None,
        }
    }

    /// Bind `dataset` to the requirement named `name`. With `fallback`, a
    /// name the template does not declare binds to its sole top-level table.
    fn bind_named(&mut self, name: &str, dataset: Dataset, fallback: bool) {
        let index = self
            .requirement_index(name)
            .or_else(|| fallback.then(|| self.sole_top_level()).flatten());
        match index {
            Some(index) => {
                let table = self.manifest.requirements[index].table.clone();
                tracing::debug!(
                    table = %table,
                    bound_as = %name,
                    rows = dataset.row_count(),
                    columns = dataset.column_count(),
                    "Dataset bound"
                );
                self.bindings[index] = Some(Binding::Data(dataset.renamed(table)));
            }
            None => {
                tracing::debug!(table = %name, "Dataset bound under undeclared name");
                let dataset = dataset.renamed(name);
                self.extra_tables.retain(|t| t.name() != name);
                self.extra_tables.push(dataset);
            }
        }
    }

    /// Index of the slot for `name`, free slots first
    fn slot_index(&self, name: &str) -> Option<usize> {
        let slots = &self.manifest.parameters;
        slots
            .iter()
            .position(|s| !s.is_linked() && s.name == name)
            .or_else(|| slots.iter().position(|s| s.is_linked() && s.name == name))
    }

    /// Resolve every requirement to a dataset, fetching connection-bound
    /// tables through the table source
    fn resolve_tables(&self) -> Result<Vec<Dataset>, EngineError> {
        let mut resolved: Vec<Option<Dataset>> = vec![None; self.bindings.len()];
        let mut by_connection: Vec<(&ConnectionInfo, Vec<usize>)> = Vec::new();

        for (index, binding) in self.bindings.iter().enumerate() {
            match binding {
                Some(Binding::Data(dataset)) => resolved[index] = Some(dataset.clone()),
                Some(Binding::Connection(connection)) => {
                    match by_connection.iter_mut().find(|(c, _)| *c == connection) {
                        Some((_, indices)) => indices.push(index),
                        None => by_connection.push((connection, vec![index])),
                    }
                }
                None => {
                    return Err(EngineError::UnboundTable(
                        self.manifest.requirements[index].table.clone(),
                    ))
                }
            }
        }

        for (connection, indices) in by_connection {
            let requirements: Vec<&DataRequirement> = indices
                .iter()
                .map(|&i| &self.manifest.requirements[i])
                .collect();
            let fetched = self.source.fetch(connection, &requirements)?;
            if fetched.len() != indices.len() {
                return Err(EngineError::Source(format!(
                    "expected {} tables, got {}",
                    indices.len(),
                    fetched.len()
                )));
            }
            for (&index, dataset) in indices.iter().zip(fetched) {
                let table = &self.manifest.requirements[index].table;
                resolved[index] = Some(dataset.renamed(table.as_str()));
            }
        }

        resolved
            .into_iter()
            .enumerate()
            .map(|(index, dataset)| {
                dataset.ok_or_else(|| {
                    EngineError::UnboundTable(self.manifest.requirements[index].table.clone())
                })
            })
            .collect()
    }

    fn export_tables(&self, format: ExportFormat) -> Result<Vec<u8>, EngineError> {
        let resolved = self.resolve_tables()?;

        // Top-level tables first, then undeclared extras, then sub-template tables
        let mut tables: Vec<&Dataset> = self
            .manifest
            .requirements
            .iter()
            .zip(&resolved)
            .filter(|(r, _)| !r.is_nested())
            .map(|(_, d)| d)
            .collect();
        tables.extend(self.extra_tables.iter());
        let top_level = tables.len();
        tables.extend(
            self.manifest
                .requirements
                .iter()
                .zip(&resolved)
                .filter(|(r, _)| r.is_nested())
                .map(|(_, d)| d),
        );

        match format {
            ExportFormat::Excel | ExportFormat::ExcelWorkbook => write_xlsx(&self.name, &tables),
            ExportFormat::Csv => write_csv(tables[..top_level].first().copied()),
            ExportFormat::Xml => write_xml(&self.name, &self.free_params(), &tables),
            _ => Err(EngineError::Export(format!("{} is not a tabular format", format))),
        }
    }

    fn export_document(&self, format: ExportFormat) -> Result<Vec<u8>, EngineError> {
        let resolved = self.resolve_tables()?;

        let mut tables: Vec<&Dataset> = Vec::new();
        let mut subreports: Vec<SubreportInputs<'_>> = self
            .manifest
            .subreports
            .iter()
            .map(|name| SubreportInputs {
                name: name.as_str(),
                params: self.linked_params(name),
                tables: Vec::new(),
            })
            .collect();

        for (requirement, dataset) in self.manifest.requirements.iter().zip(&resolved) {
            match &requirement.owner {
                Some(owner) if requirement.is_nested() => {
                    if let Some(sub) = subreports.iter_mut().find(|s| s.name == owner.as_str()) {
                        sub.tables.push(dataset);
                    }
                }
                _ => tables.push(dataset),
            }
        }
        tables.extend(self.extra_tables.iter());

        let inputs = ReportInputs {
            name: &self.name,
            format,
            params: self.free_params(),
            tables,
            subreports,
        };

        let document = compile_layout(
            &self.layout,
            render_prelude(self.selection.as_deref()),
            inputs.to_dict(),
            self.root.clone(),
        )?;

        export_layout(&document, format)
    }

    /// Values applied to free slots
    fn free_params(&self) -> Vec<(&str, &CellValue)> {
        self.manifest
            .parameters
            .iter()
            .zip(&self.values)
            .filter(|(slot, _)| !slot.is_linked())
            .filter_map(|(slot, value)| value.as_ref().map(|v| (slot.name.as_str(), v)))
            .collect()
    }

    /// Values of a sub-template's linked slots; a slot without its own value
    /// takes the free parameter of the same name
    fn linked_params(&self, subreport: &str) -> Vec<(&str, &CellValue)> {
        let free = self.free_params();
        self.manifest
            .parameters
            .iter()
            .zip(&self.values)
            .filter(|(slot, _)| slot.owner.as_deref() == Some(subreport))
            .filter_map(|(slot, value)| {
                let value = value.as_ref().or_else(|| {
                    free.iter()
                        .find(|(name, _)| *name == slot.name)
                        .map(|(_, v)| *v)
                });
                value.map(|v| (slot.name.as_str(), v))
            })
            .collect()
    }
}

impl ReportDocument for TypstDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn data_requirements(&self) -> &[DataRequirement] {
        &self.manifest.requirements
    }

    fn parameter_slots(&self) -> &[ParameterSlot] {
        &self.manifest.parameters
    }

    fn bind_connection(
        &mut self,
        requirement: &DataRequirement,
        connection: &ConnectionInfo,
    ) -> Result<(), EngineError> {
        let index = self
            .manifest
            .requirements
            .iter()
            .position(|r| r == requirement)
            .ok_or_else(|| {
                EngineError::Binding(format!(
                    "template '{}' does not declare table '{}'",
                    self.name, requirement.table
                ))
            })?;

        tracing::debug!(
            table = %requirement.table,
            server = %connection.server,
            database = %connection.database,
            "Table bound to connection"
        );
        self.bindings[index] = Some(Binding::Connection(connection.clone()));
        Ok(())
    }

    fn bind_dataset(&mut self, name: &str, dataset: Dataset) -> Result<(), EngineError> {
        self.bind_named(name, dataset, true);
        Ok(())
    }

    fn bind_collection(&mut self, collection: DatasetCollection) -> Result<(), EngineError> {
        for dataset in collection {
            let name = dataset.name().to_string();
            self.bind_named(&name, dataset, false);
        }
        Ok(())
    }

    fn set_parameter(&mut self, name: &str, value: &CellValue) -> Result<(), ParameterError> {
        let index = self
            .slot_index(name)
            .ok_or_else(|| ParameterError::UnknownSlot(name.to_string()))?;
        let slot = &self.manifest.parameters[index];

        let coerced = slot.kind.coerce(value).ok_or_else(|| ParameterError::WrongKind {
            name: name.to_string(),
            expected: slot.kind,
            found: value
                .kind()
                .map(|k| k.to_string())
                .unwrap_or_else(|| "null".to_string()),
        })?;

        tracing::debug!(parameter = %name, value = %coerced, "Parameter applied");
        self.values[index] = Some(coerced);
        Ok(())
    }

    fn set_record_selection(&mut self, formula: &str) {
        tracing::debug!(formula = %formula, "Record selection installed");
        self.selection = Some(formula.to_string());
    }

    fn export(self, format: ExportFormat) -> Result<Vec<u8>, EngineError> {
        let bytes = if format.is_layout() {
            self.export_document(format)?
        } else {
            self.export_tables(format)?
        };

        tracing::info!(
            report = %self.name,
            format = %format,
            bytes = bytes.len(),
            "Report exported"
        );
        Ok(bytes)
    }
}

impl Drop for TypstDocument {
    fn drop(&mut self) {
        tracing::debug!(report = %self.name, "Report document released");
    }
}
