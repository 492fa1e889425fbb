//! API handlers for the report server
//!
//! - Fixed reports rendered from self-supplying templates (cached with ETags)
//! - Generate endpoints fed with caller rows or a caller table
//! - Sample endpoints feeding fixed demonstration rows
//! - Health check

use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use report_core::{Exporter, RenderRequest, RenderedReport, Renderer};
use report_engine::TypstEngine;
use serde::Serialize;
use tracing::info;

use crate::cache::{client_cache_with_etag, CachePolicy};
use crate::error::ServerError;
use crate::models::{DataTableReportRequest, RecordsetReportRequest};
use crate::samples::{self, SampleReport};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub renderer: Arc<Renderer<TypstEngine>>,
    pub exporter: Arc<Exporter<TypstEngine>>,
    pub cache: CachePolicy,
}

/// A GET endpoint bound to one template and download name
#[derive(Debug, Clone, Copy)]
pub struct FixedReport {
    pub route: &'static str,
    pub template_path: &'static str,
    pub template_file_name: &'static str,
    pub export_file_name: &'static str,
}

pub const FIXED_REPORTS: [FixedReport; 4] = [
    FixedReport {
        route: "/api/Reports/Financial/VarianceAnalysisReport",
        template_path: "~/Reports/Financial",
        template_file_name: "YTDVarianceCrossTab.rpt",
        export_file_name: "YTDVarianceCrossTab.pdf",
    },
    FixedReport {
        route: "/api/Reports/Demonstration/ComparativeIncomeStatement",
        template_path: "~/Reports/Demonstration",
        template_file_name: "ComparativeIncomeStatement.rpt",
        export_file_name: "ComparativeIncomeStatement.pdf",
    },
    FixedReport {
        route: "/api/Reports/VersatileandPrecise/Invoice",
        template_path: "~/Reports/VersatileandPrecise",
        template_file_name: "Invoice.rpt",
        export_file_name: "Invoice.pdf",
    },
    FixedReport {
        route: "/api/Reports/VersatileandPrecise/FortifyFinancialAllinOneRetirementSavings",
        template_path: "~/Reports/VersatileandPrecise",
        template_file_name: "FortifyFinancialAllinOneRetirementSavings.rpt",
        export_file_name: "FortifyFinancialAllinOneRetirementSavings.pdf",
    },
];

/// Every route the server answers, without the transport layers added in
/// `main`
pub fn router(state: AppState) -> Router {
    let mut fixed = Router::new();
    for report in FIXED_REPORTS {
        fixed = fixed.route(
            report.route,
            get(move |State(state): State<AppState>| handle_fixed_report(state, report)),
        );
    }
    let fixed = fixed.route_layer(middleware::from_fn_with_state(
        state.cache,
        client_cache_with_etag,
    ));

    Router::new()
        .route("/health", get(handle_health))
        .route(
            "/api/Reports/GenerateWithRecordset",
            post(handle_generate_with_recordset),
        )
        .route(
            "/api/Reports/GenerateWithDataTable",
            post(handle_generate_with_data_table),
        )
        .route(
            "/api/Reports/Sample/CustomerReport",
            get(handle_sample_customer_report),
        )
        .route(
            "/api/Reports/Sample/SalesReport",
            get(handle_sample_sales_report),
        )
        .route(
            "/api/Reports/Sample/ExistingDataReport",
            get(handle_sample_existing_data_report),
        )
        .merge(fixed)
        .with_state(state)
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "report-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Binary body with download headers
fn report_response(report: RenderedReport) -> Response {
    let disposition = content_disposition(&report.file_name);
    (
        [
            (header::CONTENT_TYPE, report.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.bytes,
    )
        .into_response()
}

/// `attachment; filename=<name>`, quoting the name when it needs it
fn content_disposition(file_name: &str) -> String {
    let name: String = file_name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '"' { '\'' } else { c })
        .collect();
    let needs_quotes = name
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, ';' | ',' | '\''));
    if needs_quotes {
        format!("attachment; filename=\"{}\"", name)
    } else {
        format!("attachment; filename={}", name)
    }
}

/// Run a synchronous pipeline on the blocking pool
async fn run_pipeline<F>(pipeline: F) -> Result<RenderedReport, ServerError>
where
    F: FnOnce() -> Result<RenderedReport, ServerError> + Send + 'static,
{
    tokio::task::spawn_blocking(pipeline)
        .await
        .map_err(|e| ServerError::Internal(format!("Rendering task failed: {}", e)))?
}

/// Handler: GET on every fixed report route
async fn handle_fixed_report(
    state: AppState,
    report: FixedReport,
) -> Result<Response, ServerError> {
    info!("Fixed report request: {}", report.route);

    let rendered = run_pipeline(move || {
        state
            .renderer
            .render(RenderRequest::new(
                report.template_path,
                report.template_file_name,
                report.export_file_name,
            ))
            .map_err(ServerError::generating("report"))
    })
    .await?;

    Ok(report_response(rendered))
}

/// Handler: POST /api/Reports/GenerateWithRecordset
pub async fn handle_generate_with_recordset(
    State(state): State<AppState>,
    Json(request): Json<Option<RecordsetReportRequest>>,
) -> Result<Response, ServerError> {
    let request =
        request.ok_or_else(|| ServerError::InvalidRequest("Request cannot be null".to_string()))?;
    let export = request.report.to_export_request()?;
    let data_source_name = request.report.data_source_name().to_string();
    let records = request.recordset_data.unwrap_or_default();

    info!(
        "Recordset request: template={}/{}, format={}, rows={}",
        export.template_path,
        export.template_file_name,
        export.format,
        records.len()
    );

    let rendered = run_pipeline(move || {
        state
            .exporter
            .render_with_records(&export, &data_source_name, &records)
            .map_err(ServerError::generating("report"))
    })
    .await?;

    Ok(report_response(rendered))
}

/// Handler: POST /api/Reports/GenerateWithDataTable
pub async fn handle_generate_with_data_table(
    State(state): State<AppState>,
    Json(request): Json<Option<DataTableReportRequest>>,
) -> Result<Response, ServerError> {
    let request =
        request.ok_or_else(|| ServerError::InvalidRequest("Request cannot be null".to_string()))?;
    let export = request.report.to_export_request()?;
    let table = request
        .data_table
        .ok_or_else(|| ServerError::InvalidRequest("DataTable cannot be null".to_string()))?;
    let data_source_name = request.report.data_source_name().to_string();

    info!(
        "DataTable request: template={}/{}, format={}",
        export.template_path, export.template_file_name, export.format
    );

    let rendered = run_pipeline(move || {
        state
            .exporter
            .render_with_dataset(&export, &data_source_name, table.into_dataset())
            .map_err(ServerError::generating("report"))
    })
    .await?;

    Ok(report_response(rendered))
}

async fn render_sample(
    state: AppState,
    sample: SampleReport,
    context: &'static str,
) -> Result<Response, ServerError> {
    info!(
        "Sample request: template={}/{}",
        sample.request.template_path, sample.request.template_file_name
    );

    let rendered = run_pipeline(move || {
        state
            .exporter
            .render_with_records(&sample.request, sample.data_source_name, &sample.records)
            .map_err(ServerError::generating(context))
    })
    .await?;

    Ok(report_response(rendered))
}

/// Handler: GET /api/Reports/Sample/CustomerReport
pub async fn handle_sample_customer_report(
    State(state): State<AppState>,
) -> Result<Response, ServerError> {
    let sample = samples::customer_report(Local::now().naive_local());
    render_sample(state, sample, "sample report").await
}

/// Handler: GET /api/Reports/Sample/SalesReport
pub async fn handle_sample_sales_report(
    State(state): State<AppState>,
) -> Result<Response, ServerError> {
    let sample = samples::sales_report(Local::now().naive_local());
    render_sample(state, sample, "sample sales report").await
}

/// Handler: GET /api/Reports/Sample/ExistingDataReport
pub async fn handle_sample_existing_data_report(
    State(state): State<AppState>,
) -> Result<Response, ServerError> {
    render_sample(
        state,
        samples::existing_data_report(),
        "report with existing data",
    )
    .await
}
