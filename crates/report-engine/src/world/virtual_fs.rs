//! Virtual filesystem for report compilation
//!
//! The main layout and the prelude live in memory. Anything else a layout
//! references (`#image("logo.png")`, `#include`) is read from the template's
//! own directory, never from outside it.

use std::collections::HashMap;
use std::path::PathBuf;

use typst::diag::{FileError, FileResult};
use typst::foundations::Bytes;
use typst::syntax::{FileId, Source, VirtualPath};

const MAIN_PATH: &str = "/main.typ";

/// A file stored in the virtual filesystem
#[derive(Debug, Clone)]
struct VirtualFile {
    content: Bytes,
}

/// In-memory files with an optional on-disk root for assets
#[derive(Debug)]
pub struct VirtualFilesystem {
    files: HashMap<FileId, VirtualFile>,
    root: Option<PathBuf>,
}

impl VirtualFilesystem {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            files: HashMap::new(),
            root,
        }
    }

    /// Mount the main layout source and return its id
    pub fn mount_main(&mut self, content: String) -> FileId {
        let id = FileId::new(None, VirtualPath::new(MAIN_PATH));
        self.files.insert(
            id,
            VirtualFile {
                content: Bytes::from(content.into_bytes()),
            },
        );
        id
    }

    /// Mount an in-memory file at a virtual path
    pub fn mount_file(&mut self, path: &str, content: Bytes) -> FileResult<FileId> {
        if path.contains("..") {
            return Err(FileError::AccessDenied);
        }

        let id = FileId::new(None, VirtualPath::new(path));
        self.files.insert(id, VirtualFile { content });
        Ok(id)
    }

    /// Get a source file by id
    pub fn get_source(&self, id: FileId) -> FileResult<Source> {
        let bytes = self.get_file(id)?;
        let text = std::str::from_utf8(&bytes).map_err(|_| FileError::InvalidUtf8)?;
        Ok(Source::new(id, text.to_string()))
    }

    /// Get a binary file by id, falling back to the template directory
    pub fn get_file(&self, id: FileId) -> FileResult<Bytes> {
        if let Some(file) = self.files.get(&id) {
            return Ok(file.content.clone());
        }
        self.read_from_root(id)
    }

    fn read_from_root(&self, id: FileId) -> FileResult<Bytes> {
        let not_found = || FileError::NotFound(id.vpath().as_rootless_path().into());

        // Packages are not available to report layouts
        if id.package().is_some() {
            return Err(not_found());
        }

        let root = self.root.as_ref().ok_or_else(not_found)?;
        // `resolve` refuses paths that escape the root
        let path = id.vpath().resolve(root).ok_or(FileError::AccessDenied)?;

        std::fs::read(&path)
            .map(Bytes::from)
            .map_err(|e| FileError::from_io(e, &path))
    }
}
