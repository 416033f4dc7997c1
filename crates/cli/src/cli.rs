use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "notetex", version, about = "Turn a converted Markdown note into journal-ready LaTeX")]
pub struct CliArgs {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Copy every image under a directory flat into another directory
    CopyFigures {
        #[arg(long, value_name = "DIR")]
        from: PathBuf,

        #[arg(long, value_name = "DIR")]
        to: PathBuf,
    },
    /// Post-process converter output and splice it into a template
    Convert(ConvertArgs),
    /// Post-process a LaTeX file without touching any template
    Process(ProcessArgs),
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Directory holding exactly one Markdown source
    #[arg(long, value_name = "DIR")]
    pub source_dir: PathBuf,

    /// Raw converter output (written first when --run-converter is given)
    #[arg(long, value_name = "FILE")]
    pub raw: PathBuf,

    /// Template containing the injection markers
    #[arg(long, value_name = "FILE")]
    pub template: PathBuf,

    /// Run the configured converter to produce --raw
    #[arg(long)]
    pub run_converter: bool,

    /// Directory the figures were copied to; enables the missing-asset check
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,

    /// YAML options file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write warnings as JSON
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ProcessArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file (stdout when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Slug of the source note, used for same-note heading links
    #[arg(long, value_name = "SLUG")]
    pub document_slug: Option<String>,

    /// YAML options file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write warnings as JSON
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}
