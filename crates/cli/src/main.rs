use std::process::ExitCode;

use clap::Parser;

use notetex::cli::CliArgs;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    notetex::init_logger(args.verbose);

    match notetex::commands::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
