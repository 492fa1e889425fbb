//! Fixed demonstration datasets for the sample endpoints

use chrono::{Duration, NaiveDateTime};
use report_core::{ExportRequest, ParameterSet};
use report_types::{ExportFormat, Record, DATE_TEXT_FORMAT};
use serde_json::{json, Value};

/// A recordset request assembled server-side
#[derive(Debug, Clone)]
pub struct SampleReport {
    pub request: ExportRequest,
    pub data_source_name: &'static str,
    pub records: Vec<Record>,
}

fn to_records(rows: Value) -> Vec<Record> {
    match rows {
        Value::Array(rows) => rows
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(record) => Some(record),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn days_ago(now: NaiveDateTime, days: i64) -> String {
    (now - Duration::days(days))
        .format(DATE_TEXT_FORMAT)
        .to_string()
}

/// Three customers with contact details and order totals
pub fn customer_report(now: NaiveDateTime) -> SampleReport {
    let records = to_records(json!([
        {
            "CustomerId": 1,
            "CustomerName": "John Doe",
            "Email": "john.doe@email.com",
            "Phone": "+1-555-0123",
            "Address": "123 Main St, Anytown, USA",
            "CreatedDate": days_ago(now, 30),
            "TotalOrders": 15.50
        },
        {
            "CustomerId": 2,
            "CustomerName": "Jane Smith",
            "Email": "jane.smith@email.com",
            "Phone": "+1-555-0456",
            "Address": "456 Oak Ave, Another City, USA",
            "CreatedDate": days_ago(now, 45),
            "TotalOrders": 32.75
        },
        {
            "CustomerId": 3,
            "CustomerName": "Bob Johnson",
            "Email": "bob.johnson@email.com",
            "Phone": "+1-555-0789",
            "Address": "789 Pine Rd, Third Town, USA",
            "CreatedDate": days_ago(now, 60),
            "TotalOrders": 8.25
        }
    ]));

    SampleReport {
        request: ExportRequest::new("~/Reports/Custom", "CustomerReport.rpt")
            .with_export_file_name("CustomerReport.pdf")
            .with_format(ExportFormat::Pdf)
            .with_parameters(
                ParameterSet::new()
                    .with("ReportTitle", "Customer Report")
                    .with("GeneratedDate", now),
            ),
        data_source_name: "CustomerData",
        records,
    }
}

/// Three orders over the last ten days
pub fn sales_report(now: NaiveDateTime) -> SampleReport {
    let records = to_records(json!([
        {
            "OrderId": 1001,
            "CustomerName": "John Doe",
            "ProductName": "Widget A",
            "Quantity": 5,
            "UnitPrice": 19.99,
            "TotalAmount": 99.95,
            "OrderDate": days_ago(now, 10),
            "SalesRep": "Alice Johnson"
        },
        {
            "OrderId": 1002,
            "CustomerName": "Jane Smith",
            "ProductName": "Widget B",
            "Quantity": 3,
            "UnitPrice": 29.99,
            "TotalAmount": 89.97,
            "OrderDate": days_ago(now, 8),
            "SalesRep": "Bob Wilson"
        },
        {
            "OrderId": 1003,
            "CustomerName": "Bob Johnson",
            "ProductName": "Widget C",
            "Quantity": 2,
            "UnitPrice": 39.99,
            "TotalAmount": 79.98,
            "OrderDate": days_ago(now, 5),
            "SalesRep": "Alice Johnson"
        }
    ]));

    let date_range = format!(
        "{} to {}",
        (now - Duration::days(30)).format("%Y-%m-%d"),
        now.format("%Y-%m-%d")
    );

    SampleReport {
        request: ExportRequest::new("~/Reports/Custom", "SalesReport.rpt")
            .with_export_file_name("SalesReport.pdf")
            .with_format(ExportFormat::Pdf)
            .with_parameters(
                ParameterSet::new()
                    .with("ReportTitle", "Sales Report")
                    .with("GeneratedDate", now)
                    .with("DateRange", date_range),
            ),
        data_source_name: "SalesData",
        records,
    }
}

/// First-quarter sales for five countries
pub fn existing_data_report() -> SampleReport {
    let records = to_records(json!([
        {"Country": "United States", "Region": "North America", "Sales": 1250000.00, "Year": 2024, "Quarter": "Q1"},
        {"Country": "Canada", "Region": "North America", "Sales": 850000.00, "Year": 2024, "Quarter": "Q1"},
        {"Country": "United Kingdom", "Region": "Europe", "Sales": 950000.00, "Year": 2024, "Quarter": "Q1"},
        {"Country": "Germany", "Region": "Europe", "Sales": 1100000.00, "Year": 2024, "Quarter": "Q1"},
        {"Country": "Japan", "Region": "Asia", "Sales": 750000.00, "Year": 2024, "Quarter": "Q1"}
    ]));

    SampleReport {
        request: ExportRequest::new("~/Reports/Demonstration", "WorldSalesReport.rpt")
            .with_export_file_name("WorldSalesReport_WithData.pdf")
            .with_format(ExportFormat::Pdf),
        data_source_name: "WorldSalesData",
        records,
    }
}
