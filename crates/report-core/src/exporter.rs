//! Data-Bound Exporter: caller-supplied tables bound to a template
//!
//! Parameters are applied best-effort here. A parameter the template rejects
//! is logged and skipped; the export goes ahead with the rest.

use report_engine::{EngineError, ReportDocument, ReportEngine};
use report_types::{Dataset, DatasetBuilder, DatasetCollection, ExportFormat, Record};

use crate::error::ReportError;
use crate::output::{export_report, RenderedReport};
use crate::parameters::{apply_parameters, ApplyPolicy, ParameterSet};
use crate::resolver::TemplateResolver;

pub const DEFAULT_EXPORT_FILE_NAME: &str = "report.pdf";

/// A request to export a template fed with caller data
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub template_path: String,
    pub template_file_name: String,
    pub export_file_name: String,
    pub format: ExportFormat,
    pub parameters: ParameterSet,
}

impl ExportRequest {
    pub fn new(template_path: impl Into<String>, template_file_name: impl Into<String>) -> Self {
        Self {
            template_path: template_path.into(),
            template_file_name: template_file_name.into(),
            export_file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
            format: ExportFormat::Pdf,
            parameters: ParameterSet::new(),
        }
    }

    pub fn with_export_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.export_file_name = file_name.into();
        self
    }

    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_parameters(mut self, parameters: ParameterSet) -> Self {
        self.parameters = parameters;
        self
    }
}

pub struct Exporter<E: ReportEngine> {
    engine: E,
    resolver: TemplateResolver,
}

impl<E: ReportEngine> Exporter<E> {
    pub fn new(engine: E, resolver: TemplateResolver) -> Self {
        Self { engine, resolver }
    }

    /// Bind one table under `data_source_name` and export
    pub fn render_with_dataset(
        &self,
        request: &ExportRequest,
        data_source_name: &str,
        dataset: Dataset,
    ) -> Result<RenderedReport, ReportError> {
        self.run(request, |document| {
            tracing::debug!(
                data_source = %data_source_name,
                rows = dataset.row_count(),
                columns = dataset.column_count(),
                "Binding dataset"
            );
            document.bind_dataset(data_source_name, dataset)
        })
    }

    /// Materialise caller rows into a table, then export as
    /// [`Exporter::render_with_dataset`] does
    pub fn render_with_records(
        &self,
        request: &ExportRequest,
        data_source_name: &str,
        records: &[Record],
    ) -> Result<RenderedReport, ReportError> {
        let mut builder = DatasetBuilder::named(data_source_name);
        for record in records {
            builder.push_json_record(record);
        }
        if builder.dropped_values() > 0 {
            tracing::debug!(
                data_source = %data_source_name,
                dropped = builder.dropped_values(),
                "Dropped values for keys absent from the first row"
            );
        }
        self.render_with_dataset(request, data_source_name, builder.build())
    }

    /// Bind several tables at once, each renamed to its key
    pub fn render_with_datasets<I, K>(
        &self,
        request: &ExportRequest,
        datasets: I,
    ) -> Result<RenderedReport, ReportError>
    where
        I: IntoIterator<Item = (K, Dataset)>,
        K: Into<String>,
    {
        let collection: DatasetCollection = datasets.into_iter().collect();
        self.run(request, |document| {
            tracing::debug!(tables = ?collection.names(), "Binding dataset collection");
            document.bind_collection(collection)
        })
    }

    fn run<F>(&self, request: &ExportRequest, bind: F) -> Result<RenderedReport, ReportError>
    where
        F: FnOnce(&mut E::Document) -> Result<(), EngineError>,
    {
        let path = self
            .resolver
            .resolve(&request.template_path, &request.template_file_name)?;
        tracing::info!(
            template = %path.display(),
            format = %request.format,
            "Exporting report"
        );

        let mut document = self.engine.load(&path).map_err(ReportError::TemplateLoad)?;
        bind(&mut document).map_err(|e| ReportError::DataBinding(e.to_string()))?;

        let applied = apply_parameters(&mut document, &request.parameters, ApplyPolicy::BestEffort)?;
        if applied < request.parameters.len() {
            tracing::info!(
                applied,
                supplied = request.parameters.len(),
                "Some parameters were skipped"
            );
        }

        export_report(document, request.format, &request.export_file_name)
    }
}
