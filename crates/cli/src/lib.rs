//! Command-line front end for notetex.

pub mod cli;
pub mod commands;
pub mod config;

/// Install the logger. `RUST_LOG` wins over the verbosity flag.
pub fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
