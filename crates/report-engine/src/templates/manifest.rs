//! Template directive parsing
//!
//! A template declares its data model in `//!` comment lines:
//!
//! ```text
//! //! @table Orders = SELECT * FROM orders WHERE year = 2024
//! //! @param Letter head: boolean
//! //! @subreport Lines
//! //! @table OrderLines
//! ```
//!
//! `@table` and `@param` lines after a `@subreport` line belong to that
//! sub-template. `//!` lines without a leading `@` are free text.

use lazy_static::lazy_static;
use regex::Regex;
use report_types::{DataRequirement, ParameterKind, ParameterSlot};
use thiserror::Error;

lazy_static! {
    static ref TABLE: Regex = Regex::new(r"^@table\s+([^=]+?)\s*(?:=\s*(.+?))?\s*$").unwrap();
    static ref PARAM: Regex = Regex::new(r"^@param\s+([^:]+?)\s*(?::\s*(\S*))?\s*$").unwrap();
    static ref SUBREPORT: Regex = Regex::new(r"^@subreport\s+(.+?)\s*$").unwrap();
}

const DIRECTIVE_PREFIX: &str = "//!";

/// A malformed directive, with its 1-based line number
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ManifestError {
    pub line: usize,
    pub message: String,
}

impl ManifestError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// The data model a template declares
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateManifest {
    pub requirements: Vec<DataRequirement>,
    pub parameters: Vec<ParameterSlot>,
    pub subreports: Vec<String>,
}

impl TemplateManifest {
    /// Parse the directive lines of a template source
    pub fn parse(source: &str) -> Result<Self, ManifestError> {
        let mut manifest = TemplateManifest::default();
        let mut owner: Option<String> = None;

        for (index, line) in source.lines().enumerate() {
            let line_no = index + 1;
            let Some(directive) = line.trim_start().strip_prefix(DIRECTIVE_PREFIX) else {
                continue;
            };
            let directive = directive.trim();
            if !directive.starts_with('@') {
                continue;
            }

            if let Some(caps) = SUBREPORT.captures(directive) {
                let name = caps[1].to_string();
                if manifest.subreports.contains(&name) {
                    return Err(ManifestError::new(
                        line_no,
                        format!("duplicate subreport '{}'", name),
                    ));
                }
                manifest.subreports.push(name.clone());
                owner = Some(name);
            } else if let Some(caps) = TABLE.captures(directive) {
                let mut requirement = DataRequirement::new(&caps[1]);
                if let Some(query) = caps.get(2) {
                    requirement = requirement.with_query(query.as_str());
                }
                if let Some(owner) = &owner {
                    requirement = requirement.owned_by(owner);
                }
                manifest.requirements.push(requirement);
            } else if let Some(caps) = PARAM.captures(directive) {
                let name = caps[1].to_string();
                let kind = match caps.get(2).map(|m| m.as_str()) {
                    None | Some("") => {
                        return Err(ManifestError::new(
                            line_no,
                            format!("parameter '{}' has no kind", name),
                        ))
                    }
                    Some(kind) => kind
                        .parse::<ParameterKind>()
                        .map_err(|e| ManifestError::new(line_no, e))?,
                };

                let duplicate = manifest
                    .parameters
                    .iter()
                    .any(|p| p.name == name && p.owner == owner);
                if duplicate {
                    return Err(ManifestError::new(
                        line_no,
                        format!("duplicate parameter '{}'", name),
                    ));
                }

                let slot = match &owner {
                    Some(owner) => ParameterSlot::linked(name, kind, owner),
                    None => ParameterSlot::new(name, kind),
                };
                manifest.parameters.push(slot);
            } else {
                return Err(ManifestError::new(
                    line_no,
                    format!("unknown directive '{}'", directive),
                ));
            }
        }

        Ok(manifest)
    }

    /// Requirements declared by the top-level template
    pub fn top_level_requirements(&self) -> impl Iterator<Item = &DataRequirement> {
        self.requirements.iter().filter(|r| !r.is_nested())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_manifest() {
        let source = r#"//! Invoice with line items
//! @table Invoices = SELECT * FROM invoices
//! @param Invoice number: number
//! @param Letter head: boolean
//! @subreport Lines
//! @table InvoiceLines
//! @param Invoice number: number
#set page(paper: "a4")
= Invoice
"#;
        let manifest = TemplateManifest::parse(source).unwrap();

        assert_eq!(
            manifest.requirements,
            vec![
                DataRequirement::new("Invoices").with_query("SELECT * FROM invoices"),
                DataRequirement::new("InvoiceLines").owned_by("Lines"),
            ]
        );
        assert_eq!(
            manifest.parameters,
            vec![
                ParameterSlot::new("Invoice number", ParameterKind::Number),
                ParameterSlot::new("Letter head", ParameterKind::Boolean),
                ParameterSlot::linked("Invoice number", ParameterKind::Number, "Lines"),
            ]
        );
        assert_eq!(manifest.subreports, vec!["Lines".to_string()]);
        assert_eq!(manifest.top_level_requirements().count(), 1);
    }

    #[test]
    fn test_plain_layout_has_empty_manifest() {
        let manifest = TemplateManifest::parse("= Title\n// a comment\nBody").unwrap();
        assert_eq!(manifest, TemplateManifest::default());
    }

    #[test]
    fn test_param_without_kind_rejected() {
        let err = TemplateManifest::parse("//! @param Title").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("no kind"));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = TemplateManifest::parse("\n//! @param Title: currency").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_unknown_directive_rejected() {
        let err = TemplateManifest::parse("//! @chart Sales").unwrap_err();
        assert!(err.message.contains("unknown directive"));
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let source = "//! @param Year: number\n//! @param Year: text";
        assert!(TemplateManifest::parse(source).is_err());
    }
}
