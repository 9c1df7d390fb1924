//! `[build]` section configuration.
//!
//! How to invoke the compiler that produces the WebAssembly artifact.
//!
//! # Example
//!
//! ```toml
//! [build]
//! command = "go"
//! args = ["build", "-o", "{output}", "."]   # {output} is replaced by `output`
//! output = "server/main.wasm"
//! env = { GOOS = "js", GOARCH = "wasm" }      # merged over the inherited environment
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Compiler invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Program to run, looked up on `PATH`.
    pub command: String,

    /// Arguments; `{output}` expands to [`BuildConfig::output`].
    pub args: Vec<String>,

    /// Artifact path, relative to the root.
    pub output: PathBuf,

    /// Extra environment for the compiler.
    pub env: BTreeMap<String, String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command: "go".to_string(),
            args: ["build", "-o", "{output}", "."]
                .into_iter()
                .map(String::from)
                .collect(),
            output: PathBuf::from("server/main.wasm"),
            env: BTreeMap::from([
                ("GOOS".to_string(), "js".to_string()),
                ("GOARCH".to_string(), "wasm".to_string()),
            ]),
        }
    }
}

impl BuildConfig {
    pub const COMMAND: FieldPath = FieldPath::new("build.command");
    pub const OUTPUT: FieldPath = FieldPath::new("build.output");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.command.trim().is_empty() {
            diag.error(Self::COMMAND, "must not be empty");
        } else if which::which(&self.command).is_err() {
            diag.warn(
                Self::COMMAND,
                format!("`{}` not found on PATH", self.command),
                "builds will fail until the toolchain is installed",
            );
        }

        if self.output.as_os_str().is_empty() {
            diag.error(Self::OUTPUT, "must not be empty");
        }
    }
}
