//! Font loading and caching
//!
//! Fonts are loaded once per process and shared by every compilation.
//! The embedded set from `typst-assets` is always present; deployments can
//! add directories of corporate fonts used by their templates.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use typst::foundations::Bytes;
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;

/// Global font cache singleton
static FONT_CACHE: OnceLock<FontCache> = OnceLock::new();

/// Get the global font cache, initializing it with embedded fonts if
/// [`init_font_cache`] was not called first
pub fn global_font_cache() -> &'static FontCache {
    FONT_CACHE.get_or_init(|| FontCache::new(&[]))
}

/// Initialize the global font cache with additional font directories.
///
/// Returns false if the cache was already initialized.
pub fn init_font_cache(font_dirs: &[PathBuf]) -> bool {
    FONT_CACHE.set(FontCache::new(font_dirs)).is_ok()
}

/// A cache of fonts available for compilation
#[derive(Debug)]
pub struct FontCache {
    book: LazyHash<FontBook>,
    fonts: Vec<Font>,
}

impl FontCache {
    /// Embedded fonts plus every font found under `font_dirs`
    pub fn new(font_dirs: &[PathBuf]) -> Self {
        let mut book = FontBook::new();
        let mut fonts = Vec::new();

        for data in typst_assets::fonts() {
            Self::push_fonts(Bytes::from_static(data), &mut book, &mut fonts);
        }

        for dir in font_dirs {
            if dir.is_dir() {
                Self::scan_font_dir(dir, &mut book, &mut fonts);
            } else {
                tracing::warn!("Font directory {} does not exist", dir.display());
            }
        }

        tracing::info!("Font cache initialized with {} fonts", fonts.len());

        Self {
            book: LazyHash::new(book),
            fonts,
        }
    }

    fn push_fonts(buffer: Bytes, book: &mut FontBook, fonts: &mut Vec<Font>) {
        for font in Font::iter(buffer) {
            book.push(font.info().clone());
            fonts.push(font);
        }
    }

    /// Recursively scan a directory for font files
    fn scan_font_dir(dir: &Path, book: &mut FontBook, fonts: &mut Vec<Font>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };

        for entry in entries.flatten() {
            let path = entry.path();

            if path.is_dir() {
                Self::scan_font_dir(&path, book, fonts);
            } else if let Some(ext) = path.extension() {
                let ext = ext.to_string_lossy().to_lowercase();
                if matches!(ext.as_str(), "ttf" | "otf" | "ttc" | "otc") {
                    match std::fs::read(&path) {
                        Ok(data) => Self::push_fonts(Bytes::from(data), book, fonts),
                        Err(e) => tracing::warn!("Skipping font {}: {}", path.display(), e),
                    }
                }
            }
        }
    }

    /// Get the font book
    pub fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    /// Get a font by index
    pub fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}
