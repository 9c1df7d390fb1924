//! Builder
//!
//! Runs the external compiler once, synchronously, and reports whether the
//! artifact was produced. The Debounced Trigger is the only caller in serve
//! mode, so builds never overlap; there is no queue and no cancellation.
//!
//! The trait is the seam tests drive with a fake compiler.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::BuildConfig;
use crate::utils::exec::{Cmd, combined_output};


/// Placeholder in `[build] args` replaced by the artifact path.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Outcome of one compiler run.
pub type BuildResult = Result<BuildReport, BuildError>;

/// A successful build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Path of the produced artifact
    pub artifact: PathBuf,
    pub elapsed: Duration,
    /// Compiler output on success (usually empty; warnings otherwise)
    pub diagnostics: String,
}

#[derive(Debug, Error)]
pub enum BuildError {
    /// The compiler could not be started at all.
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The compiler ran and exited non-zero.
    #[error("build failed ({status})")]
    Exit { status: String, diagnostics: String },

    /// The blocking build task panicked or was cancelled.
    #[error("build task aborted: {0}")]
    Aborted(String),
}

impl BuildError {
    /// Compiler output to show the user, if any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::Exit { diagnostics, .. } if !diagnostics.is_empty() => Some(diagnostics),
            _ => None,
        }
    }
}

/// Something that turns the source tree into the artifact.
pub trait Builder: Send + Sync {
    fn build(&self) -> BuildResult;

    /// Short human-readable form, e.g. `go build -o server/main.wasm .`
    fn describe(&self) -> String;
}

/// Production builder: runs `[build] command` with `[build] args` in the
/// root directory, `[build] env` merged over the inherited environment.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    program: PathBuf,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    cwd: PathBuf,
    artifact: PathBuf,
}

impl CommandBuilder {
    pub fn from_config(root: &Path, config: &BuildConfig) -> Self {
        let output = config.output.to_string_lossy().into_owned();
        let args = config
            .args
            .iter()
            .map(|arg| arg.replace(OUTPUT_PLACEHOLDER, &output))
            .collect();

        // Resolve on PATH up front; an unresolved name is still tried as-is
        // so the spawn error names what the user configured.
        let program = which::which(&config.command).unwrap_or_else(|_| PathBuf::from(&config.command));

        Self {
            program,
            args,
            envs: config.env.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            cwd: root.to_path_buf(),
            artifact: root.join(&config.output),
        }
    }

    #[cfg(test)]
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    fn command(&self) -> Cmd {
        Cmd::new(&self.program)
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .cwd(&self.cwd)
    }
}

impl Builder for CommandBuilder {
    fn build(&self) -> BuildResult {
        let cmd = self.command();
        crate::debug!("build"; "running {}", self.describe());

        let started = Instant::now();
        let output = cmd.output().map_err(|source| BuildError::Spawn {
            program: cmd.program_name(),
            source,
        })?;
        let elapsed = started.elapsed();
        let diagnostics = combined_output(&output);

        if !output.status.success() {
            return Err(BuildError::Exit {
                status: output.status.to_string(),
                diagnostics,
            });
        }

        if !diagnostics.is_empty() {
            crate::debug!("build"; "{}", diagnostics);
        }

        Ok(BuildReport {
            artifact: self.artifact.clone(),
            elapsed,
            diagnostics,
        })
    }

    fn describe(&self) -> String {
        let program = self
            .program
            .file_name()
            .map_or_else(|| self.program.to_string_lossy(), |n| n.to_string_lossy());
        std::iter::once(program.into_owned())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
