use std::path::Path;

use notetex_core::{
    CopyReport, Diagnostics, NotetexError, PostProcessor, Result, check_missing_assets,
    copy_figures, document_slug, find_source_document, inject_into_file, run_converter,
    write_atomically,
};

use crate::cli::{CliArgs, Command, ConvertArgs, ProcessArgs};
use crate::config::load_options;

pub fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::CopyFigures { from, to } => copy(&from, &to).map(|_| ()),
        Command::Convert(convert_args) => convert(&convert_args).map(|_| ()),
        Command::Process(process_args) => process(&process_args).map(|_| ()),
    }
}

pub fn copy(from: &Path, to: &Path) -> Result<CopyReport> {
    let report = copy_figures(from, to)?;
    println!("Copied {} figure(s) to {}", report.copied.len(), to.display());
    Ok(report)
}

fn read_input(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(NotetexError::MissingInput(path.to_path_buf()));
    }
    std::fs::read_to_string(path).map_err(|err| NotetexError::file_access(path, err))
}

fn write_report(path: &Path, diagnostics: &Diagnostics) -> Result<()> {
    let json = serde_json::to_string_pretty(diagnostics)
        .map_err(|err| NotetexError::InternalError(format!("report serialization: {err}")))?;
    write_atomically(path, &json)
}

fn summarize(diagnostics: &Diagnostics) {
    if diagnostics.has_warnings() {
        log::warn!("{} warning(s)", diagnostics.count());
    }
}

/// Discover the source, optionally run the converter, post-process, and
/// splice into the template. The template is written only if every step succeeds.
pub fn convert(args: &ConvertArgs) -> Result<Diagnostics> {
    let options = load_options(args.config.as_deref())?;
    let source = find_source_document(&args.source_dir)?;
    log::info!("Source document: {}", source.display());

    if !args.template.is_file() {
        return Err(NotetexError::MissingInput(args.template.clone()));
    }

    if args.run_converter {
        if let Some(parent) = args.raw.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|err| NotetexError::file_access(parent, err))?;
        }
        run_converter(&options.converter, &source, &args.raw)?;
    }
    let raw = read_input(&args.raw)?;

    let mut processor = PostProcessor::new(options);
    if let Some(slug) = document_slug(&source) {
        processor = processor.with_document_slug(slug);
    }
    let output = processor.process(&raw);
    let mut diagnostics = output.diagnostics;
    if let Some(assets) = &args.assets {
        check_missing_assets(&output.content, assets, &mut diagnostics);
    }

    inject_into_file(&args.template, &output.content)?;
    if let Some(report) = &args.report {
        write_report(report, &diagnostics)?;
    }
    summarize(&diagnostics);
    println!("Updated {}", args.template.display());
    Ok(diagnostics)
}

pub fn process(args: &ProcessArgs) -> Result<Diagnostics> {
    let options = load_options(args.config.as_deref())?;
    let raw = read_input(&args.input)?;

    let mut processor = PostProcessor::new(options);
    if let Some(slug) = &args.document_slug {
        processor = processor.with_document_slug(slug.clone());
    }
    let output = processor.process(&raw);

    match &args.output {
        Some(path) => write_atomically(path, &output.content)?,
        None => print!("{}", output.content),
    }
    if let Some(report) = &args.report {
        write_report(report, &output.diagnostics)?;
    }
    summarize(&output.diagnostics);
    Ok(output.diagnostics)
}
