//! Locating the single Markdown source document.

use std::path::{Path, PathBuf};

use crate::slug::slugify;
use crate::{NotetexError, Result};

/// The one `*.md` file directly inside `dir`.
///
/// Zero or several candidates is an error; nothing is converted in either case.
pub fn find_source_document(dir: &Path) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(NotetexError::MissingInput(dir.to_path_buf()));
    }

    let entries = std::fs::read_dir(dir).map_err(|err| NotetexError::file_access(dir, err))?;
    let mut candidates = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|err| NotetexError::file_access(dir, err))?
            .path();
        let is_markdown = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));
        if is_markdown && path.is_file() {
            candidates.push(path);
        }
    }
    candidates.sort();

    match candidates.len() {
        0 => Err(NotetexError::NoSourceDocument(dir.to_path_buf())),
        1 => Ok(candidates.remove(0)),
        _ => Err(NotetexError::MultipleSourceDocuments {
            dir: dir.to_path_buf(),
            files: candidates,
        }),
    }
}

/// Slug of a source document, taken from its file stem.
pub fn document_slug(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let slug = slugify(stem);
    (!slug.is_empty()).then_some(slug)
}
