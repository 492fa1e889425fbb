//! Tests for the report server API
//!
//! Test categories:
//! - Request model fuzzing (property tests)
//! - HTTP endpoints against the shipped templates under `Reports/`

#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;
    use report_types::ExportFormat;
    use serde_json::json;

    use crate::models::RecordsetReportRequest;

    proptest! {
        /// Property: any export format string yields a request with a known
        /// format and a download name carrying its extension
        #[test]
        fn any_format_builds_a_request(format in ".{0,12}") {
            let request: RecordsetReportRequest = serde_json::from_value(json!({
                "reportPath": "~/Reports/Custom",
                "reportFileName": "RecordsetReport.rpt",
                "exportFormat": format,
            }))
            .unwrap();

            let export = request.report.to_export_request().unwrap();
            prop_assert!(ExportFormat::ALL.contains(&export.format));
            let expected_name = format!("RecordsetReport.{}", export.format.extension());
            prop_assert_eq!(export.export_file_name, expected_name);
        }

        /// Property: a blank path or file name is always rejected
        #[test]
        fn blank_path_rejected(path in "[ \t]{0,3}", file in "[A-Za-z]{1,10}") {
            let request: RecordsetReportRequest = serde_json::from_value(json!({
                "reportPath": path,
                "reportFileName": file,
            }))
            .unwrap();
            prop_assert!(request.report.to_export_request().is_err());
        }

        /// Property: row values of any JSON scalar are accepted
        #[test]
        fn recordset_rows_accept_scalars(
            n in any::<i64>(),
            x in -1.0e9f64..1.0e9,
            s in "[a-zA-Z0-9 ]{0,16}",
            b in any::<bool>()
        ) {
            let request: RecordsetReportRequest = serde_json::from_value(json!({
                "reportPath": "~/Reports/Custom",
                "reportFileName": "RecordsetReport.rpt",
                "recordsetData": [{"n": n, "x": x, "s": s, "b": b, "missing": null}],
            }))
            .unwrap();
            let rows = request.recordset_data.unwrap_or_default();
            prop_assert_eq!(rows.len(), 1);
            prop_assert_eq!(rows[0].len(), 5);
        }
    }
}

#[cfg(test)]
mod http_endpoint_tests {
    //! HTTP endpoint integration tests using axum-test

    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::http::{header, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use pretty_assertions::assert_eq;
    use report_core::{Exporter, Renderer, TemplateResolver};
    use report_engine::TypstEngine;
    use report_types::ConnectionInfo;
    use serde_json::{json, Value};

    use crate::api::{router, AppState};
    use crate::cache::CachePolicy;

    fn content_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    }

    /// Create a test server over the shipped templates, without a database
    fn create_test_server() -> TestServer {
        create_test_server_with(None)
    }

    fn create_test_server_with(connection: Option<ConnectionInfo>) -> TestServer {
        let engine = TypstEngine::new();
        let resolver = TemplateResolver::new(content_root());
        let state = AppState {
            renderer: Arc::new(Renderer::new(engine.clone(), resolver.clone(), connection)),
            exporter: Arc::new(Exporter::new(engine, resolver)),
            cache: CachePolicy::new(60),
        };

        TestServer::new(router(state)).unwrap()
    }

    fn recordset_body(rows: Value) -> Value {
        json!({
            "reportPath": "~/Reports/Custom",
            "reportFileName": "RecordsetReport.rpt",
            "exportFilename": "Recordset.pdf",
            "exportFormat": "PDF",
            "recordsetData": rows,
            "parameters": {"ReportTitle": "Recordset"}
        })
    }

    fn header_str(response: &axum_test::TestResponse, name: header::HeaderName) -> String {
        response.header(name).to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_returns_200() {
        let server = create_test_server();
        let response = server.get("/health").await;
        response.assert_status_ok();

        let json = response.json::<Value>();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "report-server");
    }

    #[tokio::test]
    async fn test_recordset_with_no_rows_renders_pdf() {
        let server = create_test_server();
        let response = server
            .post("/api/Reports/GenerateWithRecordset")
            .json(&recordset_body(json!([])))
            .await;

        response.assert_status_ok();
        assert_eq!(header_str(&response, header::CONTENT_TYPE), "application/pdf");
        assert_eq!(
            header_str(&response, header::CONTENT_DISPOSITION),
            "attachment; filename=Recordset.pdf"
        );
        assert!(response.as_bytes().starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_recordset_rows_render_pdf() {
        let server = create_test_server();
        let response = server
            .post("/api/Reports/GenerateWithRecordset")
            .json(&recordset_body(json!([
                {"Country": "Japan", "Sales": 750000.0, "Closed": "2024-03-31"},
                {"Country": "Germany", "Sales": "n/a"},
                {"Country": null, "Extra": true}
            ])))
            .await;

        response.assert_status_ok();
        assert!(response.as_bytes().starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_recordset_default_data_source_binds_single_table() {
        let server = create_test_server();
        let response = server
            .post("/api/Reports/GenerateWithRecordset")
            .json(&json!({
                "ReportPath": "~/Reports/Custom",
                "ReportFileName": "CustomerReport.rpt",
                "ExportFormat": "csv",
                "Parameters": {"ReportTitle": "Customers"},
                "RecordsetData": [
                    {"CustomerName": "John Doe", "TotalOrders": 15.5}
                ]
            }))
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.text(),
            "CustomerName,TotalOrders\nJohn Doe,15.5\n"
        );
    }

    #[tokio::test]
    async fn test_recordset_csv_export() {
        let server = create_test_server();
        let response = server
            .post("/api/Reports/GenerateWithRecordset")
            .json(&json!({
                "ReportPath": "~/Reports/Custom",
                "ReportFileName": "RecordsetReport.rpt",
                "ExportFilename": "rows.csv",
                "ExportFormat": "csv",
                "RecordsetData": [
                    {"Name": "Ada", "Score": 10},
                    {"Name": "Grace"}
                ]
            }))
            .await;

        response.assert_status_ok();
        assert_eq!(header_str(&response, header::CONTENT_TYPE), "text/csv");
        assert_eq!(response.text(), "Name,Score\nAda,10\nGrace,\n");
    }

    #[tokio::test]
    async fn test_recordset_excel_export() {
        let server = create_test_server();
        let mut body = recordset_body(json!([{"Region": "Europe", "Total": 2050000}]));
        body["exportFormat"] = json!("Excel");
        body["exportFilename"] = json!("regions.xls");

        let response = server
            .post("/api/Reports/GenerateWithRecordset")
            .json(&body)
            .await;

        response.assert_status_ok();
        assert_eq!(
            header_str(&response, header::CONTENT_TYPE),
            "application/vnd.ms-excel"
        );
        // xlsx is a zip container
        assert!(response.as_bytes().starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_unknown_format_falls_back_to_pdf() {
        let server = create_test_server();
        let mut body = recordset_body(json!([]));
        body["exportFormat"] = json!("postscript");

        let response = server
            .post("/api/Reports/GenerateWithRecordset")
            .json(&body)
            .await;

        response.assert_status_ok();
        assert_eq!(header_str(&response, header::CONTENT_TYPE), "application/pdf");
    }

    #[tokio::test]
    async fn test_invalid_parameter_is_skipped() {
        let server = create_test_server();
        let mut body = recordset_body(json!([{"A": 1}]));
        body["parameters"] = json!({"ReportTitle": "Still renders", "NoSuchParameter": 5});

        let response = server
            .post("/api/Reports/GenerateWithRecordset")
            .json(&body)
            .await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_missing_report_path_rejected() {
        let server = create_test_server();
        let mut body = recordset_body(json!([]));
        body["reportPath"] = json!("");

        let response = server
            .post("/api/Reports/GenerateWithRecordset")
            .json(&body)
            .await;

        response.assert_status_bad_request();
        let json = response.json::<Value>();
        assert_eq!(json["error"], "ReportPath and ReportFileName are required");
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_null_request_rejected() {
        let server = create_test_server();
        let response = server
            .post("/api/Reports/GenerateWithRecordset")
            .json(&Value::Null)
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["error"], "Request cannot be null");
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let server = create_test_server();
        let mut body = recordset_body(json!([]));
        body["reportPath"] = json!("~/Reports/../../etc");

        let response = server
            .post("/api/Reports/GenerateWithRecordset")
            .json(&body)
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_missing_template_is_server_error() {
        let server = create_test_server();
        let mut body = recordset_body(json!([]));
        body["reportFileName"] = json!("NoSuchReport.rpt");

        let response = server
            .post("/api/Reports/GenerateWithRecordset")
            .json(&body)
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let json = response.json::<Value>();
        let error = json["error"].as_str().unwrap();
        assert!(error.starts_with("Error generating report: "), "{}", error);
        assert!(error.contains("NoSuchReport.typ"), "{}", error);
        assert_eq!(json["code"], "TEMPLATE_LOAD_ERROR");
    }

    #[tokio::test]
    async fn test_data_table_null_rejected() {
        let server = create_test_server();
        let response = server
            .post("/api/Reports/GenerateWithDataTable")
            .json(&json!({
                "reportPath": "~/Reports/Custom",
                "reportFileName": "RecordsetReport.rpt",
                "exportFilename": "table.pdf",
                "dataTable": null
            }))
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["error"], "DataTable cannot be null");
    }

    #[tokio::test]
    async fn test_data_table_structured_renders() {
        let server = create_test_server();
        let response = server
            .post("/api/Reports/GenerateWithDataTable")
            .json(&json!({
                "ReportPath": "~/Reports/Custom",
                "ReportFileName": "RecordsetReport.rpt",
                "ExportFilename": "table.xml",
                "ExportFormat": "XML",
                "DataTable": {
                    "TableName": "Ignored",
                    "Columns": [{"ColumnName": "Region"}, {"ColumnName": "Total"}],
                    "Rows": [["Europe", 2050000], ["Asia", 750000]]
                }
            }))
            .await;

        response.assert_status_ok();
        assert_eq!(header_str(&response, header::CONTENT_TYPE), "application/xml");
        let xml = response.text();
        assert!(xml.contains("MainDataSource"), "{}", xml);
        assert!(xml.contains("Europe"), "{}", xml);
    }

    #[tokio::test]
    async fn test_data_table_rows_render_rtf() {
        let server = create_test_server();
        let response = server
            .post("/api/Reports/GenerateWithDataTable")
            .json(&json!({
                "reportPath": "~/Reports/Custom",
                "reportFileName": "RecordsetReport.rpt",
                "exportFilename": "table.rtf",
                "exportFormat": "rtf",
                "parameters": {"ReportTitle": "Regions"},
                "dataTable": [{"Region": "Europe"}, {"Region": "Asia"}]
            }))
            .await;

        response.assert_status_ok();
        assert_eq!(header_str(&response, header::CONTENT_TYPE), "application/rtf");
        let rtf = response.text();
        assert!(rtf.starts_with("{\\rtf1"), "{}", rtf);
        assert!(rtf.contains("Regions"));
    }

    #[tokio::test]
    async fn test_fixed_report_cached_with_etag() {
        let server = create_test_server();
        let route = "/api/Reports/VersatileandPrecise/FortifyFinancialAllinOneRetirementSavings";

        let response = server.get(route).await;
        response.assert_status_ok();
        assert_eq!(
            header_str(&response, header::CONTENT_DISPOSITION),
            "attachment; filename=FortifyFinancialAllinOneRetirementSavings.pdf"
        );
        assert_eq!(
            header_str(&response, header::CACHE_CONTROL),
            "private, max-age=60"
        );
        assert!(response.as_bytes().starts_with(b"%PDF"));
        let etag = header_str(&response, header::ETAG);

        let cached = server
            .get(route)
            .add_header(header::IF_NONE_MATCH, HeaderValue::from_str(&etag).unwrap())
            .await;
        cached.assert_status(StatusCode::NOT_MODIFIED);
        assert!(cached.as_bytes().is_empty());

        let stale = server
            .get(route)
            .add_header(header::IF_NONE_MATCH, HeaderValue::from_static("\"stale\""))
            .await;
        stale.assert_status_ok();
    }

    #[tokio::test]
    async fn test_fixed_report_without_connection_fails() {
        let server = create_test_server();
        let response = server
            .get("/api/Reports/Financial/VarianceAnalysisReport")
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let json = response.json::<Value>();
        assert_eq!(json["code"], "DATA_BINDING_ERROR");
        assert!(response.headers().get(header::ETAG).is_none());
    }

    #[tokio::test]
    async fn test_fixed_report_with_unreachable_database_fails() {
        let server = create_test_server_with(Some(ConnectionInfo::new(
            "db01", "Finance", "report", "secret",
        )));
        let response = server
            .get("/api/Reports/Demonstration/ComparativeIncomeStatement")
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let error = response.json::<Value>()["error"].as_str().unwrap().to_string();
        assert!(error.contains("IncomeStatement"), "{}", error);
        assert!(!error.contains("secret"), "{}", error);
    }

    #[tokio::test]
    async fn test_sample_reports_render() {
        let server = create_test_server();
        for (route, file_name) in [
            ("/api/Reports/Sample/CustomerReport", "CustomerReport.pdf"),
            ("/api/Reports/Sample/SalesReport", "SalesReport.pdf"),
            (
                "/api/Reports/Sample/ExistingDataReport",
                "WorldSalesReport_WithData.pdf",
            ),
        ] {
            let response = server.get(route).await;
            response.assert_status_ok();
            assert_eq!(
                header_str(&response, header::CONTENT_DISPOSITION),
                format!("attachment; filename={}", file_name)
            );
            assert!(response.as_bytes().starts_with(b"%PDF"), "{}", route);
        }
    }
}
