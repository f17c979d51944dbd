use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ndpda::analysis::stats::AutomatonStats;
use ndpda::io::load_definition;
use ndpda::pushdown::AlphabetReducer;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "ndpda-utils", version = "0.1.0", about = "Utility tools for ndpda automaton definitions")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Writes size statistics of an automaton and its reduced form as JSON.
    Stats {
        /// Path to the automaton definition JSON file.
        #[clap(short, long, value_parser)]
        input_json: PathBuf,

        /// Output file for the statistics. Prints to stdout when omitted.
        #[clap(short, long, value_parser)]
        output: Option<PathBuf>,
    },

    /// Looks up rules of the reduced automaton.
    ///
    /// Either prints the reduced rule at a 1-based index, or translates a
    /// derivation of the source automaton into reduced rule indices.
    Rule {
        /// Path to the automaton definition JSON file.
        #[clap(short, long, value_parser)]
        input_json: PathBuf,

        /// 1-based index of the reduced rule to print.
        #[clap(long, value_parser)]
        index: Option<usize>,

        /// Comma-separated source derivation to translate, e.g. "1,4,5,2,3".
        #[clap(long, value_parser, value_delimiter = ',')]
        derivation: Option<Vec<usize>>,
    },
}

#[derive(Serialize, Debug)]
struct StatsReport {
    source: AutomatonStats,
    reduced: AutomatonStats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { input_json, output } => {
            let definition = load_definition(&input_json)?;
            let automaton = definition.to_automaton()?;
            let compiled = automaton.compile();
            let reduced = AlphabetReducer::new(&compiled)?.reduce()?;

            let report = StatsReport {
                source: AutomatonStats::of(&automaton),
                reduced: AutomatonStats::of(&reduced),
            };

            let writer: Box<dyn Write> = match &output {
                Some(path) => Box::new(
                    File::create(path)
                        .with_context(|| format!("Failed to create output file: {}", path.display()))?,
                ),
                None => Box::new(io::stdout()),
            };
            let mut writer = BufWriter::new(writer);
            serde_json::to_writer_pretty(&mut writer, &report).context("Failed to serialize statistics")?;
            writeln!(writer)?;
            writer.flush()?;

            if let Some(path) = output {
                eprintln!("Successfully wrote statistics to {}", path.display());
            }
        }
        Commands::Rule { input_json, index, derivation } => {
            if index.is_none() && derivation.is_none() {
                bail!("Nothing to look up: pass --index or --derivation");
            }

            let definition = load_definition(&input_json)?;
            let automaton = definition.to_automaton()?;
            let compiled = automaton.compile();
            let reducer = AlphabetReducer::new(&compiled)?;

            if let Some(index) = index {
                let reduced = reducer.reduce()?;
                let rule = reduced.rule(index)?;
                println!("{}: {}", index, rule);
            }

            if let Some(derivation) = derivation {
                match reducer.translate(&derivation)? {
                    Some(translated) => {
                        let indices: Vec<String> = translated.iter().map(|i| i.to_string()).collect();
                        println!("{}", indices.join(","));
                    }
                    None => bail!("The derivation cannot be applied to the source automaton"),
                }
            }
        }
    }

    Ok(())
}
