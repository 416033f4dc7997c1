//! Figure assets: copying images next to the template and checking references.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::error::{Diagnostics, Warning};
use crate::passes::figures::{is_image_path, normalize_file_name};
use crate::{NotetexError, Result};

static INCLUDEGRAPHICS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\includegraphics(?:\[[^\]]*\])?\{(?P<path>[^{}]+)\}")
        .expect("valid includegraphics regex")
});

/// Outcome of [`copy_figures`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    /// Destination of every copied file, in walk order.
    pub copied: Vec<PathBuf>,
    /// Non-image files that were skipped.
    pub skipped: usize,
}

/// Copy every image under `from` (recursively) flat into `to`.
///
/// Whitespace in file names becomes `_`; existing files are overwritten.
pub fn copy_figures(from: &Path, to: &Path) -> Result<CopyReport> {
    if !from.is_dir() {
        return Err(NotetexError::MissingInput(from.to_path_buf()));
    }
    std::fs::create_dir_all(to).map_err(|err| NotetexError::file_access(to, err))?;

    let mut report = CopyReport::default();
    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(from).to_path_buf();
            NotetexError::file_access(path, err.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !is_image_path(&name) {
            report.skipped += 1;
            continue;
        }

        let target = to.join(normalize_file_name(&name));
        if report.copied.contains(&target) {
            log::warn!(
                "{} overwrites an image copied earlier in this run",
                entry.path().display()
            );
        }
        std::fs::copy(entry.path(), &target)
            .map_err(|err| NotetexError::file_access(entry.path(), err))?;
        log::debug!("copied {} -> {}", entry.path().display(), target.display());
        report.copied.push(target);
    }

    log::info!(
        "Copied {} figure(s) from {} to {}",
        report.copied.len(),
        from.display(),
        to.display()
    );
    Ok(report)
}

/// Paths named by `\includegraphics` in `latex`, in document order.
pub fn referenced_figures(latex: &str) -> Vec<&str> {
    INCLUDEGRAPHICS
        .captures_iter(latex)
        .filter_map(|caps| caps.name("path"))
        .map(|m| m.as_str().trim())
        .collect()
}

/// Warn about every local `\includegraphics` target whose file is absent from `assets_dir`.
pub fn check_missing_assets(latex: &str, assets_dir: &Path, diagnostics: &mut Diagnostics) {
    for path in referenced_figures(latex) {
        if path.starts_with("http://") || path.starts_with("https://") {
            continue;
        }
        let file_name = path.rsplit('/').next().unwrap_or(path);
        if !assets_dir.join(file_name).is_file() {
            diagnostics.warn(Warning::MissingAsset {
                path: path.to_string(),
            });
        }
    }
}
