//! Structured markup export of parameters and bound tables
//!
//! ```xml
//! <Report name="SalesReport">
//!   <Parameters>
//!     <Parameter name="ReportTitle" kind="text">Sales</Parameter>
//!   </Parameters>
//!   <Table name="Orders">
//!     <Row><Field name="OrderId">1001</Field></Row>
//!   </Table>
//! </Report>
//! ```

use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use report_types::{CellValue, Dataset};

use crate::compiler::EngineError;

pub fn write_xml(
    report_name: &str,
    params: &[(&str, &CellValue)],
    tables: &[&Dataset],
) -> Result<Vec<u8>, EngineError> {
    let mut xml = XmlOut::new();

    xml.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    xml.start(BytesStart::new("Report").with_attributes([("name", report_name)]))?;

    xml.start(BytesStart::new("Parameters"))?;
    for (name, value) in params {
        let kind = value.kind().map(|k| k.to_string()).unwrap_or_default();
        let start = BytesStart::new("Parameter")
            .with_attributes([("name", *name), ("kind", kind.as_str())]);
        xml.element(start, value)?;
    }
    xml.end("Parameters")?;

    for table in tables {
        xml.start(BytesStart::new("Table").with_attributes([("name", table.name())]))?;
        for record in table.records() {
            xml.start(BytesStart::new("Row"))?;
            for (column, value) in record {
                xml.element(BytesStart::new("Field").with_attributes([("name", column)]), value)?;
            }
            xml.end("Row")?;
        }
        xml.end("Table")?;
    }

    xml.end("Report")?;
    Ok(xml.finish())
}

struct XmlOut {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlOut {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), EngineError> {
        self.writer
            .write_event(event)
            .map_err(|e| EngineError::Export(format!("XML export failed: {}", e)))
    }

    fn start(&mut self, start: BytesStart<'_>) -> Result<(), EngineError> {
        self.event(Event::Start(start))
    }

    fn end(&mut self, name: &str) -> Result<(), EngineError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    /// A text element; null values are written as empty elements
    fn element(&mut self, start: BytesStart<'_>, value: &CellValue) -> Result<(), EngineError> {
        if value.is_null() {
            return self.event(Event::Empty(start));
        }
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let text = value.to_string();
        self.event(Event::Start(start))?;
        self.event(Event::Text(BytesText::new(&text)))?;
        self.end(&name)
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner().into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_types::{Column, ValueKind};

    #[test]
    fn test_xml_document() {
        let title = CellValue::from("Q1 <Sales> & Returns");
        let table = Dataset::from_parts(
            "Orders",
            vec![
                Column::new("OrderId", ValueKind::Integer),
                Column::new("Product", ValueKind::Text),
            ],
            vec![vec![CellValue::Integer(1001), CellValue::Null]],
        );

        let xml = String::from_utf8(
            write_xml("SalesReport", &[("ReportTitle", &title)], &[&table]).unwrap(),
        )
        .unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<Report name=\"SalesReport\">"));
        assert!(xml.contains(
            "<Parameter name=\"ReportTitle\" kind=\"text\">Q1 &lt;Sales&gt; &amp; Returns</Parameter>"
        ));
        assert!(xml.contains("<Field name=\"OrderId\">1001</Field>"));
        assert!(xml.contains("<Field name=\"Product\"/>"));
        assert!(xml.trim_end().ends_with("</Report>"));
    }
}
