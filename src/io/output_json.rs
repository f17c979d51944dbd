use crate::io::definition::AutomatonDefinition;
use crate::pushdown::Automaton;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Writes an automaton to a JSON file in the definition format.
pub fn write_automaton_json(path: &Path, automaton: &Automaton) -> Result<()> {
    log::info!("Writing automaton to JSON: {}", path.display());

    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &AutomatonDefinition::from_automaton(automaton))
        .with_context(|| format!("Failed to serialize automaton to {}", path.display()))?;
    Ok(())
}
