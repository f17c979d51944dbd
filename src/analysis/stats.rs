use crate::pushdown::Automaton;
use serde::Serialize;

/// Size figures of an automaton, used to judge the cost of a reduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutomatonStats {
    pub n: usize,
    pub states: usize,
    pub accepting_states: usize,
    pub rules: usize,
    pub terminals: usize,
    pub nonterminals: usize,
    pub max_rule_depth: usize,
    pub bottom_rules: usize,
}

impl AutomatonStats {
    pub fn of(automaton: &Automaton) -> Self {
        let rules = automaton.rules();
        AutomatonStats {
            n: automaton.n(),
            states: automaton.states().len(),
            accepting_states: automaton.accepting_states().len(),
            rules: rules.len(),
            terminals: automaton.terminals().len(),
            nonterminals: automaton.nonterminals().len(),
            max_rule_depth: rules.iter().map(|rule| rule.depth).max().unwrap_or(0),
            bottom_rules: rules.iter().filter(|rule| rule.is_bottom_rule()).count(),
        }
    }
}

/// Calculates and prints statistics about an automaton.
pub fn calculate_and_print_stats(label: &str, automaton: &Automaton) -> AutomatonStats {
    let stats = AutomatonStats::of(automaton);

    println!("----------------------------------------");
    println!("Automaton Statistics ({}):", label);
    println!("  Expansion Bound (n):   {}", stats.n);
    println!("  States:                {}", stats.states);
    println!("  Accepting States:      {}", stats.accepting_states);
    println!("  Rules:                 {}", stats.rules);
    println!("  Bottom Rules:          {}", stats.bottom_rules);
    println!("  Max Rule Depth:        {}", stats.max_rule_depth);
    println!("  Terminals:             {}", stats.terminals);
    println!("  Nonterminals:          {}", stats.nonterminals);
    println!("----------------------------------------");

    stats
}
