//! Post-processing options and their YAML loader.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{NotetexError, Result};

/// What a bare `[[Note]]` wikilink (no heading) resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BareNotePolicy {
    /// `\hyperref[<note-slug>]{Note}`
    #[default]
    NoteSlug,
    /// `\hyperref[<note-slug>--introduction]{Note}`
    Introduction,
    /// No link; the display text is emitted as-is.
    PlainText,
}

/// What happens to a longtable that has no caption marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UncaptionedTables {
    /// Leave the `longtable` environment as the converter wrote it.
    #[default]
    KeepLongtable,
    /// Restructure into a float + `tabularx` without a caption.
    Convert,
}

/// External converter invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterOptions {
    /// Program to run.
    pub program: String,
    /// Arguments placed between the input path and `-o <output>`.
    pub args: Vec<String>,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            program: "pandoc".to_string(),
            args: vec![
                "--from=markdown+tex_math_dollars".to_string(),
                "--to=latex".to_string(),
                "--wrap=preserve".to_string(),
            ],
        }
    }
}

/// Options controlling the rewrite passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Float specifier for figures and portrait tables.
    pub figure_placement: String,
    /// Directory, relative to the template, that holds copied figures.
    pub figure_root: String,
    /// Resolution of `[[Note]]` links without a heading.
    pub bare_note_policy: BareNotePolicy,
    /// Handling of longtables without a caption marker.
    pub uncaptioned_tables: UncaptionedTables,
    /// Tables with more columns than this are typeset sideways.
    pub landscape_threshold: usize,
    /// Keep `p{}` columns whose absolute width is at least this many centimetres.
    pub preserve_fixed_width_cm: Option<f64>,
    /// Vertical space inserted after an outermost list.
    pub list_spacing: String,
    /// Insert `\newpage` before every `\section{`.
    pub section_page_breaks: bool,
    /// Replace Unicode arrows with math macros.
    pub unicode_arrows: bool,
    /// Warn about `\ref`/`\hyperref` targets without a matching `\label`.
    pub check_references: bool,
    /// Converter used by `convert --run-converter`.
    pub converter: ConverterOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            figure_placement: "htbp".to_string(),
            figure_root: "figures".to_string(),
            bare_note_policy: BareNotePolicy::default(),
            uncaptioned_tables: UncaptionedTables::default(),
            landscape_threshold: 5,
            preserve_fixed_width_cm: None,
            list_spacing: "\\medskip".to_string(),
            section_page_breaks: true,
            unicode_arrows: true,
            check_references: true,
            converter: ConverterOptions::default(),
        }
    }
}

impl Options {
    /// Parse options from YAML text. Missing keys keep their defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str::<Options>(content)?)
    }
}

/// Load options from a YAML file.
pub fn load_options_from_yaml_file(path: &Path) -> Result<Options> {
    let content =
        std::fs::read_to_string(path).map_err(|err| NotetexError::file_access(path, err))?;
    Options::from_yaml_str(&content)
}
