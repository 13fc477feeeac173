//! Reporting the run's result back to the invoking CI host.

use colored::Colorize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Name of the result value carrying the written changelog path.
pub const FILE_PATH_OUTPUT: &str = "filePath";

/// Append `name=value` to the host's step output file.
pub fn set_output(output_file: &Path, name: &str, value: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(output_file)?;
    writeln!(file, "{name}={value}")
}

/// Report success: log completion and publish `filePath` when the host
/// provides an output file (`GITHUB_OUTPUT`).
pub fn report_success(path: &Path) -> std::io::Result<()> {
    let path = path.display().to_string();
    info!(path = %path, "Changelog generated successfully.");
    match std::env::var_os("GITHUB_OUTPUT") {
        Some(output_file) if !output_file.is_empty() => {
            debug!("publishing {FILE_PATH_OUTPUT} to host outputs");
            set_output(Path::new(&output_file), FILE_PATH_OUTPUT, &path)
        }
        _ => Ok(()),
    }
}

/// Format the terminal failure line. Under a CI host this is a workflow
/// `::error::` command so the step is annotated with the message.
pub fn failure_line(message: &str, on_ci_host: bool) -> String {
    if on_ci_host {
        format!("::error::{}", escape_command_data(message))
    } else {
        format!("{} {}", "error:".red().bold(), message)
    }
}

/// Percent-encode the characters a workflow command treats specially.
fn escape_command_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

pub fn report_failure(message: &str) {
    let on_ci_host = std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true");
    if on_ci_host {
        println!("{}", failure_line(message, true));
    } else {
        eprintln!("{}", failure_line(message, false));
    }
}
