//! Template Renderer: self-supplying templates rendered to PDF
//!
//! The template pulls its own data through the configured database
//! connection. Missing parameters are completed by the default policy and
//! every parameter must apply cleanly.

use chrono::{Local, NaiveDateTime};
use report_engine::{ReportDocument, ReportEngine};
use report_types::{ConnectionInfo, ExportFormat};

use crate::error::ReportError;
use crate::output::{export_report, RenderedReport};
use crate::parameters::{apply_parameters, complete_parameters, ApplyPolicy, ParameterSet};
use crate::resolver::TemplateResolver;

/// A request to render a self-supplying template
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    pub template_path: String,
    pub template_file_name: String,
    pub export_file_name: String,
    pub parameters: ParameterSet,
    /// Record-selection formula, passed to the engine verbatim
    pub record_selection: Option<String>,
}

impl RenderRequest {
    pub fn new(
        template_path: impl Into<String>,
        template_file_name: impl Into<String>,
        export_file_name: impl Into<String>,
    ) -> Self {
        Self {
            template_path: template_path.into(),
            template_file_name: template_file_name.into(),
            export_file_name: export_file_name.into(),
            ..Self::default()
        }
    }

    pub fn with_parameters(mut self, parameters: ParameterSet) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_record_selection(mut self, formula: impl Into<String>) -> Self {
        self.record_selection = Some(formula.into());
        self
    }
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub struct Renderer<E: ReportEngine> {
    engine: E,
    resolver: TemplateResolver,
    connection: Option<ConnectionInfo>,
    clock: fn() -> NaiveDateTime,
}

impl<E: ReportEngine> Renderer<E> {
    pub fn new(engine: E, resolver: TemplateResolver, connection: Option<ConnectionInfo>) -> Self {
        Self {
            engine,
            resolver,
            connection,
            clock: local_now,
        }
    }

    /// Replace the clock used for date parameter defaults
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn render(&self, request: RenderRequest) -> Result<RenderedReport, ReportError> {
        let path = self
            .resolver
            .resolve(&request.template_path, &request.template_file_name)?;
        tracing::info!(template = %path.display(), "Rendering report");

        let mut document = self.engine.load(&path).map_err(ReportError::TemplateLoad)?;

        let requirements = document.data_requirements().to_vec();
        if !requirements.is_empty() {
            let connection = self.connection.as_ref().ok_or_else(|| {
                ReportError::DataBinding(format!(
                    "Report '{}' reads {} table(s) but no database connection is configured",
                    document.name(),
                    requirements.len()
                ))
            })?;
            for requirement in &requirements {
                document
                    .bind_connection(requirement, connection)
                    .map_err(|e| ReportError::DataBinding(e.to_string()))?;
            }
        }

        let parameters =
            complete_parameters(document.parameter_slots(), request.parameters, (self.clock)());
        apply_parameters(&mut document, &parameters, ApplyPolicy::FailFast)?;

        if let Some(formula) = request.record_selection.as_deref() {
            if !formula.trim().is_empty() {
                document.set_record_selection(formula);
            }
        }

        export_report(document, ExportFormat::Pdf, &request.export_file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeEngine, FakeTemplate};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use report_types::{CellValue, DataRequirement, ParameterKind, ParameterSlot};

    const TEMPLATE: &str = "/app/Reports/Financial/YTDVarianceCrossTab.typ";

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn template() -> FakeTemplate {
        FakeTemplate {
            requirements: vec![
                DataRequirement::new("Ledger"),
                DataRequirement::new("Budget").owned_by("BudgetDetail"),
            ],
            parameters: vec![
                ParameterSlot::new("Year", ParameterKind::Number),
                ParameterSlot::new("Letter head", ParameterKind::Boolean),
                ParameterSlot::linked("Account", ParameterKind::Text, "BudgetDetail"),
            ],
            fail_export: false,
        }
    }

    fn renderer(engine: FakeEngine, connection: Option<ConnectionInfo>) -> Renderer<FakeEngine> {
        Renderer::new(engine, TemplateResolver::new("/app"), connection).with_clock(fixed_now)
    }

    fn connection() -> ConnectionInfo {
        ConnectionInfo::new("db01", "Finance", "report", "secret")
    }

    fn request() -> RenderRequest {
        RenderRequest::new(
            "~/Reports/Financial",
            "YTDVarianceCrossTab.rpt",
            "YTDVarianceCrossTab.pdf",
        )
    }

    #[test]
    fn test_full_pipeline() {
        let engine = FakeEngine::new().with_template(TEMPLATE, template());
        let report = renderer(engine.clone(), Some(connection()))
            .render(
                request()
                    .with_parameters(ParameterSet::new().with("Year", 2024i64))
                    .with_record_selection("row.Region == \"EMEA\""),
            )
            .unwrap();

        assert_eq!(report.file_name, "YTDVarianceCrossTab.pdf");
        assert_eq!(report.content_type(), "application/pdf");
        assert_eq!(
            engine.calls(),
            vec![
                Call::Loaded("YTDVarianceCrossTab".to_string()),
                Call::Connection {
                    table: "Ledger".to_string(),
                    database: "Finance".to_string()
                },
                Call::Connection {
                    table: "Budget".to_string(),
                    database: "Finance".to_string()
                },
                Call::Parameter("Year".to_string(), CellValue::Integer(2024)),
                Call::Parameter("Letter head".to_string(), CellValue::Boolean(true)),
                Call::Selection("row.Region == \"EMEA\"".to_string()),
                Call::Exported(ExportFormat::Pdf),
                Call::Released("YTDVarianceCrossTab".to_string()),
            ]
        );
    }

    #[test]
    fn test_template_without_tables_needs_no_connection() {
        let engine = FakeEngine::new().with_template(
            TEMPLATE,
            FakeTemplate {
                parameters: vec![ParameterSlot::new("AsOf", ParameterKind::Date)],
                ..FakeTemplate::default()
            },
        );
        renderer(engine.clone(), None).render(request()).unwrap();

        assert!(engine
            .calls()
            .contains(&Call::Parameter("AsOf".to_string(), CellValue::Date(fixed_now()))));
    }

    #[test]
    fn test_missing_connection_is_binding_error() {
        let engine = FakeEngine::new().with_template(TEMPLATE, template());
        let err = renderer(engine.clone(), None).render(request()).unwrap_err();

        assert!(matches!(err, ReportError::DataBinding(_)));
        assert_eq!(
            engine.calls().last(),
            Some(&Call::Released("YTDVarianceCrossTab".to_string()))
        );
    }

    #[test]
    fn test_unknown_parameter_fails_loudly() {
        let engine = FakeEngine::new().with_template(TEMPLATE, template());
        let err = renderer(engine.clone(), Some(connection()))
            .render(request().with_parameters(ParameterSet::new().with("Quarter", "Q1")))
            .unwrap_err();

        assert!(matches!(
            err,
            ReportError::ParameterApplication { ref name, .. } if name == "Quarter"
        ));
        let calls = engine.calls();
        assert!(!calls.iter().any(|c| matches!(c, Call::Exported(_))));
        assert_eq!(
            calls.last(),
            Some(&Call::Released("YTDVarianceCrossTab".to_string()))
        );
    }

    #[test]
    fn test_missing_template() {
        let err = renderer(FakeEngine::new(), None)
            .render(request())
            .unwrap_err();
        assert!(matches!(err, ReportError::TemplateLoad(_)));
    }

    #[test]
    fn test_export_failure_still_releases() {
        let mut failing = template();
        failing.fail_export = true;
        let engine = FakeEngine::new().with_template(TEMPLATE, failing);

        let err = renderer(engine.clone(), Some(connection()))
            .render(request())
            .unwrap_err();
        assert!(matches!(err, ReportError::Export(_)));
        assert_eq!(
            engine.calls().last(),
            Some(&Call::Released("YTDVarianceCrossTab".to_string()))
        );
    }

    #[test]
    fn test_blank_selection_not_installed() {
        let engine = FakeEngine::new().with_template(TEMPLATE, template());
        renderer(engine.clone(), Some(connection()))
            .render(request().with_record_selection("  "))
            .unwrap();
        assert!(!engine
            .calls()
            .iter()
            .any(|c| matches!(c, Call::Selection(_))));
    }
}
