//! Template files: directive manifest and layout prelude

pub mod manifest;
pub mod prelude;

pub use manifest::{ManifestError, TemplateManifest};
pub use prelude::{render_prelude, PRELUDE_PATH};
