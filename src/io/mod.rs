pub mod definition;
pub mod output_json;
pub mod output_text;

pub use definition::{load_definition, AutomatonDefinition, RuleDefinition, RunDefinition};
pub use output_json::write_automaton_json;
pub use output_text::{render_automaton, write_automaton_text};
