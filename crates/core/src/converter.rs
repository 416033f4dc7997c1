//! Invocation of the external Markdown to LaTeX converter.

use std::path::Path;
use std::process::Command;

use crate::options::ConverterOptions;
use crate::{NotetexError, Result};

/// Arguments passed to the converter for one run: `<source> <args...> -o <output>`.
pub fn converter_args(options: &ConverterOptions, source: &Path, output: &Path) -> Vec<String> {
    let mut args = Vec::with_capacity(options.args.len() + 3);
    args.push(source.display().to_string());
    args.extend(options.args.iter().cloned());
    args.push("-o".to_string());
    args.push(output.display().to_string());
    args
}

/// Run the converter and wait for it. A non-zero exit is an error carrying its stderr.
pub fn run_converter(options: &ConverterOptions, source: &Path, output: &Path) -> Result<()> {
    if !source.is_file() {
        return Err(NotetexError::MissingInput(source.to_path_buf()));
    }

    let args = converter_args(options, source, output);
    log::info!("Running {} {}", options.program, args.join(" "));
    let result = Command::new(&options.program)
        .args(&args)
        .output()
        .map_err(|err| NotetexError::Converter {
            program: options.program.clone(),
            message: format!("could not start: {err}"),
        })?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(NotetexError::Converter {
            program: options.program.clone(),
            message: format!("{} {}", result.status, stderr.trim()),
        });
    }
    if !output.is_file() {
        return Err(NotetexError::Converter {
            program: options.program.clone(),
            message: format!("no output written to {}", output.display()),
        });
    }
    Ok(())
}
