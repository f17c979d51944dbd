use anyhow::{Context, Result};
use clap::Parser;
use ndpda::analysis::stats::calculate_and_print_stats;
use ndpda::args::{Command, NdpdaArgs};
use ndpda::config::Config;
use ndpda::io::{load_definition, render_automaton, write_automaton_json, write_automaton_text, AutomatonDefinition};
use ndpda::pushdown::{AlphabetReducer, CompiledAutomaton, LogObserver, Verdict};
use std::time::Instant;

fn main() -> Result<()> {
    let args = NdpdaArgs::parse();
    let config = Config::from_args(&args);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.default_log_filter()))
        .init();

    config.validate()?;

    let definition = load_definition(&config.definition_path)?;
    let automaton = definition
        .to_automaton()
        .with_context(|| format!("Failed to build automaton from {}", config.definition_path.display()))?;
    let compiled = automaton.compile();
    log::info!(
        "Loaded automaton with {} rules and {} states (n = {})",
        automaton.rules().len(),
        automaton.states().len(),
        automaton.n()
    );

    match &args.command {
        Command::Simulate { reduced, .. } => {
            let all_accepted = simulate_runs(&definition, &compiled, *reduced)?;
            if !all_accepted {
                std::process::exit(1);
            }
        }
        Command::Reduce { output_json, output_text, stats, .. } => {
            let start = Instant::now();
            let reduced = AlphabetReducer::new(&compiled)?.reduce()?;
            log::info!("Reduction completed in {:?}", start.elapsed());

            if let Some(json_path) = output_json {
                write_automaton_json(json_path, &reduced)?;
            }
            if let Some(text_path) = output_text {
                write_automaton_text(text_path, &reduced)?;
            }
            if *stats {
                calculate_and_print_stats("source", &automaton);
                calculate_and_print_stats("reduced", &reduced);
            }
            if output_json.is_none() && output_text.is_none() && !*stats {
                print!("{}", render_automaton(&reduced));
            }
        }
        Command::Render { reduced, .. } => {
            if *reduced {
                let reduced = AlphabetReducer::new(&compiled)?.reduce()?;
                print!("{}", render_automaton(&reduced));
            } else {
                print!("{}", render_automaton(&automaton));
            }
        }
    }

    Ok(())
}

/// Checks every run of the definition, optionally against the reduced
/// automaton as well. Returns true when every check accepted.
fn simulate_runs(definition: &AutomatonDefinition, compiled: &CompiledAutomaton, check_reduced: bool) -> Result<bool> {
    if definition.runs.is_empty() {
        log::warn!("The definition lists no runs; nothing to simulate.");
    }

    let reducer = if check_reduced { Some(AlphabetReducer::new(compiled)?) } else { None };
    let reduced = match &reducer {
        Some(reducer) => Some(reducer.reduce()?.compile()),
        None => None,
    };

    let mut all_accepted = true;
    for run in &definition.runs {
        let label = run.label();
        let tokens = run.tokens()?;
        let verdict = compiled
            .run(&tokens, &run.derivation, &mut LogObserver)
            .with_context(|| format!("Run '{}' could not be checked", label))?;
        all_accepted &= report(&label, &verdict);

        if let (Some(reducer), Some(reduced)) = (&reducer, &reduced) {
            let label = format!("{} (reduced)", label);
            match reducer.translate(&run.derivation)? {
                Some(derivation) => {
                    log::info!("Reduced derivation for '{}': {:?}", label, derivation);
                    let verdict = reduced
                        .run(&tokens, &derivation, &mut LogObserver)
                        .with_context(|| format!("Run '{}' could not be checked", label))?;
                    all_accepted &= report(&label, &verdict);
                }
                None => {
                    println!("{}: rejected (the derivation has no reduced counterpart)", label);
                    all_accepted = false;
                }
            }
        }
    }

    Ok(all_accepted)
}

fn report(label: &str, verdict: &Verdict) -> bool {
    match verdict {
        Verdict::Accepted => println!("{}: accepted", label),
        Verdict::Rejected(reason) => println!("{}: rejected ({})", label, reason),
    }
    verdict.is_accepted()
}
