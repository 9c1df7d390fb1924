//! External command execution utilities.
//!
//! Provides a Builder-based API for running the compiler toolchain.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! // Captured run (waits for exit)
//! let output = Cmd::new("go")
//!     .args(["build", "-o", "server/main.wasm", "."])
//!     .envs([("GOOS", "js"), ("GOARCH", "wasm")])
//!     .cwd(root)
//!     .output()?;
//! ```

use std::{
    ffi::{OsStr, OsString},
    io,
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
};

// ============================================================================
// Builder API
// ============================================================================

/// Command builder for external process execution.
#[derive(Debug, Default, Clone)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Add a single argument.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            let arg = arg.as_ref();
            if !arg.is_empty() {
                self.args.push(arg.to_owned());
            }
        }
        self
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Set environment variables for the subprocess (merged over the
    /// inherited environment).
    pub fn envs<K, V, I>(mut self, vars: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in vars {
            self.envs.push((k.as_ref().to_owned(), v.as_ref().to_owned()));
        }
        self
    }

    /// Get the program name for error messages.
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).envs(self.envs.iter().cloned());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Run to completion, capturing stdout and stderr.
    ///
    /// A non-zero exit is not an error here; callers inspect `status`.
    pub fn output(&self) -> io::Result<Output> {
        self.command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Combine captured stderr and stdout into one trimmed diagnostic block.
///
/// Compilers write errors to stderr; stdout is appended only when present.
pub fn combined_output(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let (stderr, stdout) = (stderr.trim(), stdout.trim());

    match (stderr.is_empty(), stdout.is_empty()) {
        (true, true) => String::new(),
        (false, true) => stderr.to_string(),
        (true, false) => stdout.to_string(),
        (false, false) => format!("{stderr}\n{stdout}"),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmd_builder() {
        let cmd = Cmd::new("go")
            .arg("build")
            .args(["-o", "server/main.wasm", "."])
            .envs([("GOOS", "js")])
            .cwd("/tmp");

        assert_eq!(cmd.program, OsString::from("go"));
        assert_eq!(cmd.args.len(), 4);
        assert_eq!(cmd.envs, vec![("GOOS".to_string(), "js".to_string())]);
        assert_eq!(cmd.cwd, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn test_empty_args_filtered() {
        let cmd = Cmd::new("echo").arg("").args(["a", "", "b"]);
        assert_eq!(cmd.args.len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_output_captures_both_streams() {
        let output = Cmd::new("sh")
            .args(["-c", "echo out; echo err >&2; exit 3"])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(combined_output(&output), "err\nout");
    }

    #[cfg(unix)]
    #[test]
    fn test_envs_reach_subprocess() {
        let output = Cmd::new("sh")
            .args(["-c", "printf %s \"$GOARCH\""])
            .envs([("GOARCH", "wasm")])
            .output()
            .unwrap();
        assert_eq!(output.stdout, b"wasm");
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let result = Cmd::new("livewasm-definitely-not-a-program").output();
        assert!(result.is_err());
    }
}
