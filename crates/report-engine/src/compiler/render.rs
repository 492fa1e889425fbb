//! Core compilation logic
//!
//! Compiles a report layout (prelude import + template source) in a
//! [`VirtualWorld`] and extracts diagnostics.

use std::path::PathBuf;

use typst::diag::{Severity, SourceDiagnostic};
use typst::foundations::Dict;
use typst::model::Document;

use super::errors::{CompileError, EngineError};
use crate::templates::prelude::PRELUDE_PATH;
use crate::world::VirtualWorld;

/// Number of compilations a memoized result may go unused before eviction
const CACHE_MAX_AGE: usize = 10;

/// Compile a layout against the given prelude and inputs.
///
/// `root` is the template's directory; files the layout references
/// (`#image`, `#include`) resolve against it.
pub fn compile_layout(
    layout: &str,
    prelude: String,
    inputs: Dict,
    root: Option<PathBuf>,
) -> Result<Document, EngineError> {
    let main = format!("#import \"{}\": *\n{}", PRELUDE_PATH, layout);
    let world = VirtualWorld::new(main, prelude, inputs, root);

    let warned = typst::compile(&world);
    comemo::evict(CACHE_MAX_AGE);

    let (_, warnings) = categorize_diagnostics(&warned.warnings);
    for warning in &warnings {
        tracing::debug!("Layout warning: {}", warning);
    }

    match warned.output {
        Ok(document) => Ok(document),
        Err(diagnostics) => {
            let (errors, _) = categorize_diagnostics(&diagnostics);
            if errors.is_empty() {
                Err(EngineError::Compile(vec![CompileError::new(
                    "Compilation failed with unknown error",
                )]))
            } else {
                Err(EngineError::Compile(errors))
            }
        }
    }
}

/// Validate Typst syntax without full compilation
pub fn validate_syntax(source: &str) -> Vec<CompileError> {
    use typst::syntax::parse;

    parse(source)
        .errors()
        .into_iter()
        .map(|error| CompileError::new(error.message.to_string()))
        .collect()
}

/// Categorize diagnostics into errors and warnings
fn categorize_diagnostics(
    diagnostics: &[SourceDiagnostic],
) -> (Vec<CompileError>, Vec<CompileError>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for diag in diagnostics {
        let mut compile_error = CompileError::new(diag.message.to_string());

        if !diag.hints.is_empty() {
            let hint = diag
                .hints
                .iter()
                .map(|h| h.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            compile_error = compile_error.with_hint(hint);
        }

        match diag.severity {
            Severity::Error => errors.push(compile_error),
            Severity::Warning => warnings.push(compile_error.as_warning()),
        }
    }

    (errors, warnings)
}
