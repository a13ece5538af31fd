// src/system/executor.rs

use std::path::Path;
use std::process::{Command as StdCommand, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, std::io::Error),
    #[error("Command '{0}' exited with a non-zero error code.")]
    NonZeroExitStatus(String),
    #[error("Command '{command}' produced output that was not valid UTF-8")]
    InvalidUtf8Output {
        command: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Runs a short-lived probe command and returns everything it printed.
///
/// Stdout and stderr are both captured and concatenated, since some tools
/// (older Python releases among them) report their version on stderr.
/// The call blocks until the child exits.
pub fn execute_and_capture_output(program: &Path, args: &[&str]) -> Result<String, ExecutionError> {
    let display = format!("{} {}", program.display(), args.join(" "));
    let display = display.trim().to_string();
    if program.as_os_str().is_empty() {
        return Err(ExecutionError::EmptyCommand);
    }

    log::debug!("Probing: {}", display);
    let output = StdCommand::new(dunce::simplified(program))
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| ExecutionError::CommandFailed(display.clone(), e))?;

    if !output.status.success() {
        return Err(ExecutionError::NonZeroExitStatus(display));
    }

    let mut bytes = output.stdout;
    bytes.extend_from_slice(&output.stderr);
    String::from_utf8(bytes).map_err(|e| ExecutionError::InvalidUtf8Output {
        command: display,
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_program_is_rejected() {
        let result = execute_and_capture_output(Path::new(""), &["--version"]);
        assert!(matches!(result, Err(ExecutionError::EmptyCommand)));
    }

    #[test]
    fn test_missing_program_reports_command_failed() {
        let result =
            execute_and_capture_output(Path::new("womm-definitely-not-a-real-binary"), &[]);
        assert!(matches!(result, Err(ExecutionError::CommandFailed(..))));
    }
}
