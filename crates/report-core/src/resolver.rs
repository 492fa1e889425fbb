//! Template path resolution
//!
//! Callers name templates the way the report designer laid them out: an
//! application-relative directory (`~/Reports/Custom`) and a file name
//! (`CustomerReport.rpt`). Both are mapped onto a `.typ` file under the
//! content root.

use std::path::{Component, Path, PathBuf};

use crate::error::ReportError;

/// Extension of template files on disk
pub const TEMPLATE_EXTENSION: &str = "typ";

/// Extension callers may still send for designer report files
const LEGACY_EXTENSION: &str = "rpt";

#[derive(Debug, Clone)]
pub struct TemplateResolver {
    root: PathBuf,
}

impl TemplateResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a request's template path and file name to a file under the root
    pub fn resolve(&self, template_path: &str, file_name: &str) -> Result<PathBuf, ReportError> {
        let directory = relative_directory(template_path)?;
        let file_name = template_file_name(file_name)?;
        Ok(self.root.join(directory).join(file_name))
    }
}

fn relative_directory(template_path: &str) -> Result<PathBuf, ReportError> {
    let normalized = template_path.trim().replace('\\', "/");
    let stripped = normalized
        .strip_prefix('~')
        .unwrap_or(&normalized)
        .trim_start_matches('/');

    let path = Path::new(stripped);
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => {
                return Err(ReportError::RequestValidation(format!(
                    "Report path '{}' must stay within the report directory",
                    template_path
                )))
            }
        }
    }
    Ok(path.to_path_buf())
}

fn template_file_name(file_name: &str) -> Result<PathBuf, ReportError> {
    let trimmed = file_name.trim();
    let path = Path::new(trimmed);
    let is_bare = matches!(
        path.components().collect::<Vec<_>>().as_slice(),
        [Component::Normal(_)]
    );
    if !is_bare || trimmed.contains('\\') {
        return Err(ReportError::RequestValidation(format!(
            "Report file name '{}' must not contain a path",
            file_name
        )));
    }

    let mut resolved = path.to_path_buf();
    let legacy_or_missing = match path.extension() {
        None => true,
        Some(ext) => ext.eq_ignore_ascii_case(LEGACY_EXTENSION),
    };
    if legacy_or_missing {
        resolved.set_extension(TEMPLATE_EXTENSION);
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolver() -> TemplateResolver {
        TemplateResolver::new("/srv/app")
    }

    #[test]
    fn test_application_relative_paths() {
        let expected = PathBuf::from("/srv/app/Reports/Custom/CustomerReport.typ");
        for path in ["~/Reports/Custom", "~/Reports/Custom/", "/Reports/Custom", "Reports/Custom", "~\\Reports\\Custom"] {
            assert_eq!(
                resolver().resolve(path, "CustomerReport.rpt").unwrap(),
                expected,
                "{}",
                path
            );
        }
    }

    #[test]
    fn test_file_extensions() {
        let r = resolver();
        assert_eq!(
            r.resolve("~/Reports", "Invoice").unwrap(),
            PathBuf::from("/srv/app/Reports/Invoice.typ")
        );
        assert_eq!(
            r.resolve("~/Reports", "Invoice.RPT").unwrap(),
            PathBuf::from("/srv/app/Reports/Invoice.typ")
        );
        assert_eq!(
            r.resolve("~/Reports", "Invoice.typ").unwrap(),
            PathBuf::from("/srv/app/Reports/Invoice.typ")
        );
    }

    #[test]
    fn test_traversal_rejected() {
        let r = resolver();
        assert!(r.resolve("~/Reports/../../etc", "passwd").is_err());
        assert!(r.resolve("~/Reports", "../secret.typ").is_err());
        assert!(r.resolve("~/Reports", "Custom/Report.typ").is_err());
        assert!(matches!(
            r.resolve("..", "Report.typ"),
            Err(ReportError::RequestValidation(_))
        ));
    }
}
