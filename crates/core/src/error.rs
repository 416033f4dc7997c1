use std::path::PathBuf;

use thiserror::Error;

/// 1-based line number of byte `offset` in `text`, clamped to the end.
pub(crate) fn line_of(text: &str, offset: usize) -> usize {
    let clamped = offset.min(text.len());
    text.as_bytes()[..clamped].iter().filter(|&&b| b == b'\n').count() + 1
}

/// Fatal errors that abort a run before anything is written.
#[derive(Debug, Error)]
pub enum NotetexError {
    /// IO error while touching a specific file or directory.
    #[error("IO error on {}: {source}", .path.display())]
    FileAccess {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// A required input path does not exist.
    #[error("Missing input: {} does not exist", .0.display())]
    MissingInput(PathBuf),
    /// The source directory holds no Markdown document.
    #[error("No source document (*.md) found in {}", .0.display())]
    NoSourceDocument(PathBuf),
    /// The source directory holds more than one Markdown document.
    #[error(
        "Expected exactly one source document in {}, found {}: {}",
        .dir.display(),
        .files.len(),
        display_paths(.files)
    )]
    MultipleSourceDocuments {
        /// Directory that was searched
        dir: PathBuf,
        /// Every candidate found
        files: Vec<PathBuf>,
    },
    /// A template sentinel line is absent.
    #[error("Template is missing injection marker: {0}")]
    TemplateMarkerMissing(String),
    /// A template sentinel line occurs more than once.
    #[error("Template marker appears {count} times (expected once): {marker}")]
    TemplateMarkerDuplicated {
        /// The duplicated marker
        marker: String,
        /// Number of occurrences
        count: usize,
    },
    /// The end marker precedes the begin marker.
    #[error("Template end marker precedes the begin marker")]
    TemplateMarkersOutOfOrder,
    /// The external converter could not be run or reported failure.
    #[error("Converter `{program}` failed: {message}")]
    Converter {
        /// Program that was invoked
        program: String,
        /// Exit status or spawn error
        message: String,
    },
    /// Configuration file could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),
    /// Internal logic error (unexpected state).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl NotetexError {
    /// Wrap an IO error with the path it concerns
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileAccess {
            path: path.into(),
            source,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, NotetexError>;

/// Kind of cross-reference that failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceKind {
    /// `\hyperref[...]` produced from a wikilink
    Wikilink,
    /// `\ref{fig:...}`
    Figure,
    /// `\ref{tbl:...}` or a `Table <slug>` mention
    Table,
    /// Any other `\ref{...}`
    Other,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReferenceKind::Wikilink => "wikilink",
            ReferenceKind::Figure => "figure",
            ReferenceKind::Table => "table",
            ReferenceKind::Other => "reference",
        };
        f.write_str(name)
    }
}

/// Non-fatal warnings that don't prevent output
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Warning {
    /// A reference whose target label is never defined
    UnresolvedReference {
        /// Kind of reference
        reference: ReferenceKind,
        /// Target key
        key: String,
    },
    /// A longtable that could not be restructured and was left untouched
    MalformedTable {
        /// Line of the table in the pass input
        line: usize,
        /// Why it was rejected
        reason: String,
    },
    /// An image referenced by the document is absent from the assets directory
    MissingAsset {
        /// Path as written in the document
        path: String,
    },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::UnresolvedReference { reference, key } => {
                write!(f, "unresolved {} reference: {}", reference, key)
            }
            Warning::MalformedTable { line, reason } => {
                write!(f, "malformed longtable at line {} left untouched: {}", line, reason)
            }
            Warning::MissingAsset { path } => write!(f, "missing figure asset: {}", path),
        }
    }
}

/// Collection of warnings gathered during one run
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Diagnostics {
    /// Warnings in the order they were raised
    pub warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Create a new empty diagnostics collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and forward it to the logger. Duplicates are dropped.
    pub fn warn(&mut self, warning: Warning) {
        if self.warnings.contains(&warning) {
            return;
        }
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Keys of every unresolved reference, in order of first appearance.
    pub fn unresolved_keys(&self) -> Vec<&str> {
        self.warnings
            .iter()
            .filter_map(|w| match w {
                Warning::UnresolvedReference { key, .. } => Some(key.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Get total count of all diagnostics
    pub fn count(&self) -> usize {
        self.warnings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_of_counts_newlines_before_offset() {
        let text = "a\nb\nc";
        assert_eq!(line_of(text, 0), 1);
        assert_eq!(line_of(text, 2), 2);
        assert_eq!(line_of(text, 4), 3);
        assert_eq!(line_of(text, 99), 3);
    }

    #[test]
    fn multiple_sources_lists_files() {
        let err = NotetexError::MultipleSourceDocuments {
            dir: PathBuf::from("input"),
            files: vec![PathBuf::from("input/a.md"), PathBuf::from("input/b.md")],
        };
        let msg = err.to_string();
        assert!(msg.contains("found 2"), "{msg}");
        assert!(msg.contains("input/a.md, input/b.md"), "{msg}");
    }

    #[test]
    fn duplicate_warnings_are_collapsed() {
        let mut diagnostics = Diagnostics::new();
        let warning = Warning::UnresolvedReference {
            reference: ReferenceKind::Table,
            key: "tbl:missing".to_string(),
        };
        diagnostics.warn(warning.clone());
        diagnostics.warn(warning);
        assert_eq!(diagnostics.count(), 1);
        assert_eq!(diagnostics.unresolved_keys(), vec!["tbl:missing"]);
    }
}
