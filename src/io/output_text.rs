use crate::pushdown::{Automaton, BOTTOM_MARKER};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn braced<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    format!("{{{}}}", items.into_iter().collect::<Vec<_>>().join(", "))
}

/// Renders the automaton in the textbook tuple notation.
pub fn render_automaton(automaton: &Automaton) -> String {
    let terminals = automaton.terminals();
    let mut out = String::new();

    out.push_str(&format!(
        "M = (Q, \u{03A3}, \u{0393}, R, {}, {}, F), n = {}\n",
        automaton.start_state(),
        automaton.start_symbol(),
        automaton.n()
    ));
    out.push_str(&format!("Q = {}\n", braced(automaton.states().iter().map(String::as_str))));
    out.push_str(&format!("\u{03A3} = {}\n", braced(terminals.iter().map(String::as_str))));

    let pushdown = terminals
        .iter()
        .chain(automaton.nonterminals().iter())
        .map(String::as_str)
        .chain(std::iter::once(BOTTOM_MARKER));
    out.push_str(&format!("\u{0393} = {}\n", braced(pushdown)));

    out.push_str("R = {\n");
    for (i, rule) in automaton.rules().iter().enumerate() {
        out.push_str(&format!("\t{}: {}\n", i + 1, rule));
    }
    out.push_str("}\n");
    out.push_str(&format!("F = {}\n", braced(automaton.accepting_states().iter().map(String::as_str))));
    out
}

/// Writes the rendered automaton to a text file.
pub fn write_automaton_text(path: &Path, automaton: &Automaton) -> Result<()> {
    log::info!("Writing automaton to Text: {}", path.display());

    let file = File::create(path)
        .with_context(|| format!("Failed to create text output file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(render_automaton(automaton).as_bytes())
        .context("Failed to write automaton text")?;
    writer.flush().context("Failed to flush automaton text")?;
    Ok(())
}
