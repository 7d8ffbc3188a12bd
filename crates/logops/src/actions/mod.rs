//! Administrative actions.
//!
//! Each one is a thin wrapper around an external program. Failures are
//! written to the action's error sink; none of them return an error to the
//! dispatcher.

pub mod admin;
pub mod renew;
pub mod storage;
pub mod trace;
pub mod update;

use std::path::Path;
use std::process::{Command, Stdio};

/// Captured result of an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Run `argv` to completion, capturing trimmed stdout and stderr.
pub fn capture(argv: &[String], cwd: Option<&Path>) -> std::io::Result<CommandOutput> {
    let (program, args) = argv.split_first().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command line")
    })?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let output = cmd.output()?;
    Ok(CommandOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_capture_success() {
        let out = capture(&argv(&["sh", "-c", "echo '  hi  '"]), None).unwrap();
        assert!(out.success);
        assert_eq!(out.stdout, "hi");
    }

    #[test]
    fn test_capture_failure_keeps_stderr() {
        let out = capture(&argv(&["sh", "-c", "echo bad >&2; exit 2"]), None).unwrap();
        assert!(!out.success);
        assert_eq!(out.stderr, "bad");
    }

    #[test]
    fn test_capture_empty_argv() {
        assert!(capture(&[], None).is_err());
    }
}
