use crate::args::{Command, NdpdaArgs};
use anyhow::{bail, Result};
use std::path::PathBuf;

/// Configuration settings derived from CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub definition_path: PathBuf,
    pub output_paths: Vec<PathBuf>,
    pub trace: bool,
}

impl Config {
    pub fn from_args(args: &NdpdaArgs) -> Self {
        let (definition_path, output_paths) = match &args.command {
            Command::Simulate { definition, .. } | Command::Render { definition, .. } => {
                (definition.clone(), Vec::new())
            }
            Command::Reduce { definition, output_json, output_text, .. } => (
                definition.clone(),
                output_json.iter().chain(output_text.iter()).cloned().collect(),
            ),
        };

        Config {
            definition_path,
            output_paths,
            trace: args.trace,
        }
    }

    /// Checks the paths before any work is done.
    pub fn validate(&self) -> Result<()> {
        if !self.definition_path.exists() {
            bail!("Automaton definition not found: {}", self.definition_path.display());
        }
        for output in &self.output_paths {
            if *output == self.definition_path {
                bail!("Refusing to overwrite the input definition {}", output.display());
            }
        }
        if self.output_paths.len() == 2 && self.output_paths[0] == self.output_paths[1] {
            bail!("JSON and text outputs both point to {}", self.output_paths[0].display());
        }
        Ok(())
    }

    /// Default log filter when RUST_LOG is not set.
    pub fn default_log_filter(&self) -> &'static str {
        if self.trace {
            "debug"
        } else {
            "info"
        }
    }
}
