use crate::pushdown::Automaton;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// JSON description of an automaton plus the guided runs to check against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomatonDefinition {
    pub n: usize,
    pub start_state: String,
    pub start_symbol: String,
    #[serde(default)]
    pub accepting_states: Vec<String>,
    pub rules: Vec<RuleDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runs: Vec<RunDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    #[serde(default = "default_depth")]
    pub depth: usize,
    pub from_state: String,
    pub from_symbol: String,
    pub to_state: String,
    // An empty replacement erases the expanded symbol.
    #[serde(default)]
    pub replacement: Vec<String>,
}

fn default_depth() -> usize {
    1
}

/// One guided run: a derivation (1-based rule indices) and the input it
/// should produce, given either as characters or as tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<String>>,
    pub derivation: Vec<usize>,
}

impl RunDefinition {
    /// The input as terminal names: one per character of `input`, or the
    /// given `tokens`.
    pub fn tokens(&self) -> Result<Vec<String>> {
        match (&self.input, &self.tokens) {
            (Some(input), None) => Ok(input.chars().map(String::from).collect()),
            (None, Some(tokens)) => Ok(tokens.clone()),
            (Some(_), Some(_)) => bail!("run '{}' gives both 'input' and 'tokens'", self.label()),
            (None, None) => bail!("run '{}' gives neither 'input' nor 'tokens'", self.label()),
        }
    }

    /// Name used in reports; falls back to the input text.
    pub fn label(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        match (&self.input, &self.tokens) {
            (Some(input), _) => input.clone(),
            (None, Some(tokens)) => tokens.join(" "),
            (None, None) => "<empty>".to_string(),
        }
    }
}

impl AutomatonDefinition {
    /// Builds the automaton, registering rules in file order.
    pub fn to_automaton(&self) -> Result<Automaton> {
        let mut automaton = Automaton::new(self.n, self.start_state.as_str(), self.start_symbol.as_str())
            .context("Invalid automaton header")?
            .with_accepting_states(self.accepting_states.iter().cloned());

        for (i, rule) in self.rules.iter().enumerate() {
            automaton
                .add_rule(
                    rule.depth,
                    &rule.from_state,
                    &rule.from_symbol,
                    &rule.to_state,
                    rule.replacement.iter().cloned(),
                )
                .with_context(|| format!("Invalid rule {}", i + 1))?;
        }
        Ok(automaton)
    }

    /// Describes an existing automaton, without runs.
    pub fn from_automaton(automaton: &Automaton) -> Self {
        AutomatonDefinition {
            n: automaton.n(),
            start_state: automaton.start_state().to_string(),
            start_symbol: automaton.start_symbol().to_string(),
            accepting_states: automaton.accepting_states().iter().cloned().collect(),
            rules: automaton
                .rules()
                .iter()
                .map(|rule| RuleDefinition {
                    depth: rule.depth,
                    from_state: rule.from_state.clone(),
                    from_symbol: rule.from_symbol.name.clone(),
                    to_state: rule.to_state.clone(),
                    replacement: rule.replacement.clone(),
                })
                .collect(),
            runs: Vec::new(),
        }
    }
}

/// Loads an automaton definition from a JSON file.
pub fn load_definition(path: &Path) -> Result<AutomatonDefinition> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open automaton definition at {}", path.display()))?;
    let reader = BufReader::new(file);
    let definition = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse automaton definition from {}", path.display()))?;
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::output_json::write_automaton_json;
    use tempfile::TempDir;

    const ABC: &str = r#"{
        "n": 3, "start_state": "s", "start_symbol": "S", "accepting_states": ["f"],
        "rules": [
            { "from_state": "s", "from_symbol": "S", "to_state": "q", "replacement": ["A", "A"] },
            { "from_state": "q", "from_symbol": "A", "to_state": "f", "replacement": ["a", "b"] },
            { "from_state": "f", "from_symbol": "A", "to_state": "f", "replacement": ["c"] },
            { "from_state": "q", "from_symbol": "A", "to_state": "p", "replacement": ["a", "A", "b"] },
            { "depth": 2, "from_state": "p", "from_symbol": "A", "to_state": "q", "replacement": ["A", "c"] }
        ],
        "runs": [ { "input": "aabbcc", "derivation": [1, 4, 5, 2, 3] } ]
    }"#;

    #[test]
    fn test_parse_definition() -> Result<()> {
        let definition: AutomatonDefinition = serde_json::from_str(ABC)?;
        assert_eq!(definition.rules[0].depth, 1);
        assert_eq!(definition.rules[4].depth, 2);

        let automaton = definition.to_automaton()?;
        let run = &definition.runs[0];
        assert_eq!(run.label(), "aabbcc");
        assert!(automaton.compile().simulate_tokens(&run.tokens()?, &run.derivation)?);
        Ok(())
    }

    #[test]
    fn test_run_needs_exactly_one_input() {
        let run = RunDefinition { name: None, input: None, tokens: None, derivation: vec![1] };
        assert!(run.tokens().is_err());

        let run = RunDefinition {
            name: Some("both".to_string()),
            input: Some("ab".to_string()),
            tokens: Some(vec!["a".to_string()]),
            derivation: vec![1],
        };
        let err = run.tokens().unwrap_err();
        assert!(err.to_string().contains("both"));
    }

    #[test]
    fn test_invalid_rule_reports_index() {
        let mut definition: AutomatonDefinition = serde_json::from_str(ABC).unwrap();
        definition.rules[2].depth = 0;
        let err = definition.to_automaton().unwrap_err();
        assert_eq!(err.to_string(), "Invalid rule 3");
    }

    #[test]
    fn test_write_and_load() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("automaton.json");
        let automaton: AutomatonDefinition = serde_json::from_str(ABC)?;
        let automaton = automaton.to_automaton()?;

        write_automaton_json(&path, &automaton)?;
        let loaded = load_definition(&path)?.to_automaton()?;
        assert_eq!(loaded, automaton);
        Ok(())
    }
}
