//! VirtualWorld implementation of the Typst World trait

use std::path::PathBuf;

use chrono::{DateTime, Datelike, Local};
use typst::diag::FileResult;
use typst::foundations::{Bytes, Datetime, Dict};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, World};

use super::fonts::{global_font_cache, FontCache};
use super::virtual_fs::VirtualFilesystem;
use crate::templates::prelude::PRELUDE_PATH;

/// A world holding one report layout, its prelude and its bound inputs
pub struct VirtualWorld {
    filesystem: VirtualFilesystem,
    main: FileId,
    font_cache: &'static FontCache,
    /// Captured once so `datetime.today()` is stable within a compilation
    time: DateTime<Local>,
    /// Standard library with `sys.inputs` configured
    library: LazyHash<Library>,
}

impl VirtualWorld {
    /// Create a world for a layout.
    ///
    /// `root` is the directory layout-relative files are read from.
    pub fn new(main: String, prelude: String, inputs: Dict, root: Option<PathBuf>) -> Self {
        let mut filesystem = VirtualFilesystem::new(root);
        let main = filesystem.mount_main(main);

        // PRELUDE_PATH is a constant without traversal segments
        if let Err(e) = filesystem.mount_file(PRELUDE_PATH, Bytes::from(prelude.into_bytes())) {
            tracing::error!("Failed to mount report prelude: {:?}", e);
        }

        Self {
            filesystem,
            main,
            font_cache: global_font_cache(),
            time: Local::now(),
            library: LazyHash::new(Library::builder().with_inputs(inputs).build()),
        }
    }
}

impl World for VirtualWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        self.font_cache.book()
    }

    fn main(&self) -> FileId {
        self.main
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        self.filesystem.get_source(id)
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        self.filesystem.get_file(id)
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.font_cache.font(index)
    }

    fn today(&self, offset: Option<i64>) -> Option<Datetime> {
        let date = match offset {
            None => self.time.date_naive(),
            Some(hours) => {
                (self.time.naive_utc() + chrono::Duration::hours(hours)).date()
            }
        };

        Datetime::from_ymd(date.year(), date.month() as u8, date.day() as u8)
    }
}
