//! One-shot build: run the compiler once and report.

use crate::{
    actor::builder::{Builder, CommandBuilder},
    config::DevConfig,
    debug, log,
    utils::path::display_relative,
};
use anyhow::Result;

/// Build the artifact once. Fails when the compiler fails.
pub fn build(config: &DevConfig) -> Result<()> {
    let builder = CommandBuilder::from_config(&config.root, &config.build);
    build_with(&builder, config)
}

fn build_with(builder: &dyn Builder, config: &DevConfig) -> Result<()> {
    debug!(
        "build";
        "{} -> {}",
        builder.describe(),
        display_relative(&config.output_path(), &config.root)
    );

    match builder.build() {
        Ok(report) => {
            if !report.diagnostics.is_empty() {
                eprintln!("{}", report.diagnostics);
            }
            log!(
                "build";
                "{} in {:.2?}",
                display_relative(&report.artifact, &config.root),
                report.elapsed
            );
            Ok(())
        }
        Err(e) => {
            if let Some(diagnostics) = e.diagnostics() {
                eprintln!("{diagnostics}");
            }
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::builder::{BuildError, BuildReport, BuildResult};
    use std::time::Duration;

    struct Fixed(bool);

    impl Builder for Fixed {
        fn build(&self) -> BuildResult {
            if self.0 {
                Ok(BuildReport {
                    artifact: "server/main.wasm".into(),
                    elapsed: Duration::from_millis(5),
                    diagnostics: String::new(),
                })
            } else {
                Err(BuildError::Exit {
                    status: "exit status: 1".into(),
                    diagnostics: "./main.go:3:1: syntax error".into(),
                })
            }
        }

        fn describe(&self) -> String {
            "fixed".into()
        }
    }

    #[test]
    fn test_success() {
        assert!(build_with(&Fixed(true), &DevConfig::default()).is_ok());
    }

    #[test]
    fn test_failure_is_error() {
        let err = build_with(&Fixed(false), &DevConfig::default()).unwrap_err();
        assert!(err.to_string().contains("build failed"));
    }
}
