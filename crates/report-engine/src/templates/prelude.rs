//! Helpers every report layout can call
//!
//! The prelude is mounted as a virtual file and imported at the top of the
//! layout. It reads bound data from `sys.inputs`.

/// Virtual path the prelude is mounted at
pub const PRELUDE_PATH: &str = "/__report_prelude.typ";

const SELECTION_MARKER: &str = "__SELECTION__";

const PRELUDE: &str = r#"// Report data access
#let report-inputs = sys.inputs
#let report-info = report-inputs.at("report", default: (:))
#let report-name = report-info.at("name", default: "")
#let report-format = report-info.at("format", default: "pdf")

// Record selection
#let report-selected(row) = { __SELECTION__ }

#let report-param(name, default: none) = {
  report-inputs.at("params", default: (:)).at(name, default: default)
}

#let subreport-scope(subreport) = {
  report-inputs.at("subreports", default: (:)).at(subreport, default: (:))
}

#let subreport-param(subreport, name, default: none) = {
  subreport-scope(subreport).at("params", default: (:)).at(name, default: default)
}

#let records(table, subreport: none) = {
  if subreport == none {
    let rows = report-inputs.at("data", default: (:)).at(table, default: ())
    rows.filter(row => report-selected(row))
  } else {
    subreport-scope(subreport).at("data", default: (:)).at(table, default: ())
  }
}

#let report-cell(value) = {
  if value == none {
    ""
  } else if type(value) == str {
    value
  } else if type(value) == bool {
    if value { "true" } else { "false" }
  } else if type(value) == datetime {
    value.display("[year]-[month]-[day]")
  } else if type(value) == float {
    str(calc.round(value, digits: 2))
  } else {
    str(value)
  }
}
"#;

/// Render the prelude with the given record-selection formula.
///
/// The formula is inserted verbatim as the body of a predicate over `row`.
/// An absent or blank formula selects every row.
pub fn render_prelude(selection: Option<&str>) -> String {
    let body = selection
        .map(str::trim)
        .filter(|formula| !formula.is_empty())
        .unwrap_or("true");
    PRELUDE.replace(SELECTION_MARKER, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selection_accepts_everything() {
        let prelude = render_prelude(None);
        assert!(prelude.contains("#let report-selected(row) = { true }"));
        assert!(!prelude.contains(SELECTION_MARKER));
    }

    #[test]
    fn test_blank_selection_is_ignored() {
        assert_eq!(render_prelude(Some("   ")), render_prelude(None));
    }

    #[test]
    fn test_selection_inserted_verbatim() {
        let prelude = render_prelude(Some(r#"row.Country == "USA""#));
        assert!(prelude.contains(r#"{ row.Country == "USA" }"#));
    }
}
