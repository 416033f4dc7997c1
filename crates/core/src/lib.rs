#![deny(missing_docs)]
//! Notetex core: post-processing of converted notes into journal-ready LaTeX.

/// Figure asset copying and missing-asset checks.
pub mod assets;
/// External converter invocation.
pub mod converter;
/// Core error and diagnostic types.
pub mod error;
/// Template splicing and atomic writes.
pub mod inject;
/// Post-processing options.
pub mod options;
/// Rewrite passes over converter output.
pub mod passes;
/// Ordered rewrite pipeline.
pub mod pipeline;
/// Slug and label utilities.
pub mod slug;
/// Source document discovery.
pub mod source;

pub use assets::{CopyReport, check_missing_assets, copy_figures, referenced_figures};
pub use converter::run_converter;
pub use error::{Diagnostics, NotetexError, ReferenceKind, Result, Warning};
pub use inject::{END_MARKER, START_MARKER, inject_body, inject_into_file, write_atomically};
pub use options::{
    BareNotePolicy, ConverterOptions, Options, UncaptionedTables, load_options_from_yaml_file,
};
pub use pipeline::{
    Pipeline, PostProcessOutput, PostProcessor, StageContext, TextTransform, process_latex,
};
pub use slug::{figure_label, heading_label, slugify};
pub use source::{document_slug, find_source_document};
