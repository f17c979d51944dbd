use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ndpda: n-expandable deep pushdown automata.
///
/// Checks guided derivations of deep pushdown automata described in JSON
/// and converts automata into their reduced two-symbol form.
#[derive(Parser, Debug, Clone)]
#[command(author = "ndpda developers", version, about, long_about = None)]
#[command(help_template = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
")]
pub struct NdpdaArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Log every rule application.
    ///
    /// Raises the default log level to debug so that step events and
    /// rejection reasons are printed. RUST_LOG still takes precedence.
    #[clap(long, global = true, action = clap::ArgAction::SetTrue)]
    pub trace: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Check every run listed in an automaton definition.
    Simulate {
        /// Automaton definition (JSON).
        #[clap(short, long, value_parser)]
        definition: PathBuf,

        /// Also check each run against the reduced automaton.
        ///
        /// The run's derivation is translated into reduced rule indices
        /// before it is checked.
        #[clap(long, action = clap::ArgAction::SetTrue)]
        reduced: bool,
    },

    /// Reduce an automaton to the pushdown alphabet {#, $}.
    Reduce {
        /// Automaton definition (JSON).
        #[clap(short, long, value_parser)]
        definition: PathBuf,

        /// Output JSON file for the reduced automaton.
        #[clap(short = 'j', long, value_parser)]
        output_json: Option<PathBuf>,

        /// Output human-readable text rendering of the reduced automaton.
        #[clap(long, value_parser)]
        output_text: Option<PathBuf>,

        /// Print statistics about the source and reduced automata.
        #[clap(long, action = clap::ArgAction::SetTrue)]
        stats: bool,
    },

    /// Print an automaton in tuple notation.
    Render {
        /// Automaton definition (JSON).
        #[clap(short, long, value_parser)]
        definition: PathBuf,

        /// Render the reduced automaton instead.
        #[clap(long, action = clap::ArgAction::SetTrue)]
        reduced: bool,
    },
}
