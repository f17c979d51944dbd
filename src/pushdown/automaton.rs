use crate::pushdown::error::{DpdaError, Result};
use crate::pushdown::rule::{CompiledRule, Rule};
use crate::pushdown::stack::DepthStack;
use crate::pushdown::symbol::{Symbol, BOTTOM_MARKER};
use crate::pushdown::trace::{NoopObserver, StepEvent, TraceObserver};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// An n-expandable deep pushdown automaton under construction.
///
/// Rules are registered here; [`Automaton::compile`] turns the rule set into
/// an immutable [`CompiledAutomaton`] that can simulate derivations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Automaton {
    /// Maximum number of pending nonterminals, bottom included.
    n: usize,
    start_state: String,
    start_symbol: String,
    accepting_states: BTreeSet<String>,
    states: BTreeSet<String>,
    /// Names that appear on the left side of some rule, plus the start symbol.
    nonterminals: BTreeSet<String>,
    rules: Vec<Rule>,
}

impl Automaton {
    /// Creates an automaton with no rules and no accepting states.
    pub fn new(n: usize, start_state: impl Into<String>, start_symbol: impl Into<String>) -> Result<Self> {
        let start_state = start_state.into();
        let start_symbol = start_symbol.into();
        if n == 0 {
            return Err(DpdaError::InvalidAutomaton("n must be at least 1".to_string()));
        }
        if start_state.is_empty() {
            return Err(DpdaError::InvalidAutomaton("start state has an empty name".to_string()));
        }
        if start_symbol.is_empty() || start_symbol == BOTTOM_MARKER {
            return Err(DpdaError::InvalidAutomaton(format!(
                "start symbol '{}' is not a valid nonterminal name",
                start_symbol
            )));
        }

        Ok(Automaton {
            n,
            states: BTreeSet::from([start_state.clone()]),
            nonterminals: BTreeSet::from([start_symbol.clone()]),
            start_state,
            start_symbol,
            accepting_states: BTreeSet::new(),
            rules: Vec::new(),
        })
    }

    /// Adds the given states to the set of accepting states.
    pub fn with_accepting_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for state in states {
            self.add_accepting_state(state);
        }
        self
    }

    pub fn add_accepting_state(&mut self, state: impl Into<String>) {
        let state = state.into();
        self.states.insert(state.clone());
        self.accepting_states.insert(state);
    }

    /// Registers the rule `depth from_state from_symbol -> to_state replacement`
    /// and returns its 1-based index.
    pub fn add_rule<I, S>(
        &mut self,
        depth: usize,
        from_state: &str,
        from_symbol: &str,
        to_state: &str,
        replacement: I,
    ) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let replacement: Vec<String> = replacement.into_iter().map(Into::into).collect();
        let rule = Rule::new(depth, from_state, from_symbol, to_state, replacement)?;
        self.push_rule(rule);
        Ok(self.rules.len())
    }

    pub(crate) fn push_rule(&mut self, rule: Rule) {
        self.states.insert(rule.from_state.clone());
        self.states.insert(rule.to_state.clone());
        if !rule.is_bottom_rule() {
            self.nonterminals.insert(rule.from_symbol.name.clone());
        }
        self.rules.push(rule);
    }

    /// Classifies every replacement name and freezes the rule set.
    ///
    /// Compiling is a pure function of the registered rules, so repeated
    /// calls yield identical results. Rules added afterwards only show up in
    /// a later compilation.
    pub fn compile(&self) -> CompiledAutomaton {
        let rules = self.rules.iter().map(|rule| rule.resolve(&self.nonterminals)).collect();
        CompiledAutomaton {
            automaton: self.clone(),
            rules,
        }
    }

    /// Compiles the current rule set and checks one derivation against it.
    pub fn simulate(&self, input: &str, derivation: &[usize]) -> Result<bool> {
        self.compile().simulate(input, derivation)
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn start_state(&self) -> &str {
        &self.start_state
    }

    pub fn start_symbol(&self) -> &str {
        &self.start_symbol
    }

    pub fn accepting_states(&self) -> &BTreeSet<String> {
        &self.accepting_states
    }

    pub fn states(&self) -> &BTreeSet<String> {
        &self.states
    }

    /// The nonterminal alphabet, bottom marker excluded.
    pub fn nonterminals(&self) -> &BTreeSet<String> {
        &self.nonterminals
    }

    /// Replacement names that are neither nonterminals nor the bottom marker.
    pub fn terminals(&self) -> BTreeSet<String> {
        self.rules
            .iter()
            .flat_map(|rule| rule.replacement.iter())
            .filter(|name| name.as_str() != BOTTOM_MARKER && !self.nonterminals.contains(*name))
            .cloned()
            .collect()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Looks up a rule by its 1-based index.
    pub fn rule(&self, index: usize) -> Result<&Rule> {
        index
            .checked_sub(1)
            .and_then(|i| self.rules.get(i))
            .ok_or(DpdaError::UnknownRule { index, count: self.rules.len() })
    }
}

/// An automaton whose replacement symbols have been classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledAutomaton {
    automaton: Automaton,
    rules: Vec<CompiledRule>,
}

impl CompiledAutomaton {
    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Looks up a compiled rule by its 1-based index.
    pub fn rule(&self, index: usize) -> Result<&CompiledRule> {
        index
            .checked_sub(1)
            .and_then(|i| self.rules.get(i))
            .ok_or(DpdaError::UnknownRule { index, count: self.rules.len() })
    }

    /// Checks a derivation against `input`, one terminal per character.
    pub fn simulate(&self, input: &str, derivation: &[usize]) -> Result<bool> {
        let tokens: Vec<String> = input.chars().map(String::from).collect();
        self.simulate_tokens(&tokens, derivation)
    }

    /// Checks a derivation against a tokenized input, one terminal per token.
    pub fn simulate_tokens<S: AsRef<str>>(&self, tokens: &[S], derivation: &[usize]) -> Result<bool> {
        let verdict = self.run(tokens, derivation, &mut NoopObserver)?;
        Ok(verdict.is_accepted())
    }

    /// Runs the guided derivation and reports why it was rejected, if it was.
    ///
    /// Every run starts from a fresh pushdown holding `[start, #]`.
    pub fn run<S: AsRef<str>>(
        &self,
        tokens: &[S],
        derivation: &[usize],
        observer: &mut dyn TraceObserver,
    ) -> Result<Verdict> {
        let verdict = self.drive(tokens, derivation, observer)?;
        match &verdict {
            Verdict::Accepted => log::debug!("derivation of {} step(s) accepted", derivation.len()),
            Verdict::Rejected(reason) => log::debug!("derivation rejected: {}", reason),
        }
        Ok(verdict)
    }

    fn drive<S: AsRef<str>>(
        &self,
        tokens: &[S],
        derivation: &[usize],
        observer: &mut dyn TraceObserver,
    ) -> Result<Verdict> {
        let automaton = &self.automaton;
        let mut stack = DepthStack::new(Symbol::nonterminal(automaton.start_symbol.as_str()));
        let mut state = automaton.start_state.as_str();

        for (position, &index) in derivation.iter().enumerate() {
            let step = position + 1;
            let compiled = self.rule(index)?;
            let rule = &compiled.rule;

            if rule.from_state != state {
                return Ok(Verdict::Rejected(Rejection::StateMismatch {
                    step,
                    rule: index,
                    expected: rule.from_state.clone(),
                    found: state.to_string(),
                }));
            }

            let pending_before = stack.pending_len();
            let pending_after = pending_before + compiled.nonterminal_count - 1;
            if pending_after > automaton.n {
                return Ok(Verdict::Rejected(Rejection::DepthBoundExceeded {
                    step,
                    rule: index,
                    pending: pending_after,
                    bound: automaton.n,
                }));
            }

            // A depth beyond the pending index is a caller error, not a rejection.
            if !stack.expand(rule.depth, &rule.from_symbol, &compiled.replacement)? {
                return Ok(Verdict::Rejected(Rejection::SymbolMismatch {
                    step,
                    rule: index,
                    expected: rule.from_symbol.clone(),
                    found: stack.pending_at(rule.depth)?.clone(),
                }));
            }

            state = rule.to_state.as_str();
            observer.on_step(&StepEvent {
                step,
                rule: index,
                depth: rule.depth,
                from_state: rule.from_state.clone(),
                to_state: rule.to_state.clone(),
                pending_before,
                pending_after: stack.pending_len(),
                tape: stack.tape().map(|s| s.name.clone()).collect(),
            });
        }

        if !stack.expansion_complete() {
            return Ok(Verdict::Rejected(Rejection::IncompleteExpansion {
                pending: stack.pending().map(|s| s.name.clone()).collect(),
            }));
        }

        for (position, token) in tokens.iter().enumerate() {
            let token = token.as_ref();
            match stack.pop_terminal() {
                Some(symbol) if symbol.name == token => {}
                popped => {
                    let found = popped.or_else(|| stack.peek().cloned());
                    return Ok(Verdict::Rejected(Rejection::InputMismatch {
                        position,
                        expected: token.to_string(),
                        found: found.map(|s| s.name),
                    }));
                }
            }
        }

        if !automaton.accepting_states.contains(state) {
            return Ok(Verdict::Rejected(Rejection::NonAcceptingState {
                state: state.to_string(),
            }));
        }

        if !stack.tape_exhausted() {
            return Ok(Verdict::Rejected(Rejection::ResidualTape {
                remaining: stack
                    .tape()
                    .filter(|s| !s.is_bottom())
                    .map(|s| s.name.clone())
                    .collect(),
            }));
        }

        Ok(Verdict::Accepted)
    }
}

/// Outcome of a guided run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Accepted,
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Why a derivation was rejected. Rejections are expected outcomes of a
/// wrong guess, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Rejection {
    StateMismatch { step: usize, rule: usize, expected: String, found: String },
    DepthBoundExceeded { step: usize, rule: usize, pending: usize, bound: usize },
    SymbolMismatch { step: usize, rule: usize, expected: Symbol, found: Symbol },
    IncompleteExpansion { pending: Vec<String> },
    InputMismatch { position: usize, expected: String, found: Option<String> },
    NonAcceptingState { state: String },
    ResidualTape { remaining: Vec<String> },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::StateMismatch { step, rule, expected, found } => write!(
                f,
                "step {}: rule {} needs state {} but the automaton is in {}",
                step, rule, expected, found
            ),
            Rejection::DepthBoundExceeded { step, rule, pending, bound } => write!(
                f,
                "step {}: rule {} would leave {} pending symbols (n = {})",
                step, rule, pending, bound
            ),
            Rejection::SymbolMismatch { step, rule, expected, found } => write!(
                f,
                "step {}: rule {} expands {} but found {}",
                step, rule, expected, found
            ),
            Rejection::IncompleteExpansion { pending } => {
                write!(f, "expansion incomplete, still pending: {}", pending.join(" "))
            }
            Rejection::InputMismatch { position, expected, found } => write!(
                f,
                "input position {}: expected {} but found {}",
                position,
                expected,
                found.as_deref().unwrap_or("nothing")
            ),
            Rejection::NonAcceptingState { state } => write!(f, "final state {} is not accepting", state),
            Rejection::ResidualTape { remaining } => {
                write!(f, "input consumed but the pushdown still holds: {}", remaining.join(" "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// L = {a^n b^n c^n : n >= 1}.
    fn abc_automaton() -> Automaton {
        let mut automaton = Automaton::new(3, "s", "S").unwrap().with_accepting_states(["f"]);
        automaton.add_rule(1, "s", "S", "q", ["A", "A"]).unwrap();
        automaton.add_rule(1, "q", "A", "f", ["a", "b"]).unwrap();
        automaton.add_rule(1, "f", "A", "f", ["c"]).unwrap();
        automaton.add_rule(1, "q", "A", "p", ["a", "A", "b"]).unwrap();
        automaton.add_rule(2, "p", "A", "q", ["A", "c"]).unwrap();
        automaton
    }

    #[test]
    fn test_new_validates_parameters() {
        assert!(matches!(Automaton::new(0, "s", "S"), Err(DpdaError::InvalidAutomaton(_))));
        assert!(matches!(Automaton::new(2, "s", "#"), Err(DpdaError::InvalidAutomaton(_))));
        assert!(matches!(Automaton::new(2, "", "S"), Err(DpdaError::InvalidAutomaton(_))));
    }

    #[test]
    fn test_alphabets_are_inferred_from_rules() {
        let automaton = abc_automaton();
        let nonterminals: Vec<&str> = automaton.nonterminals().iter().map(String::as_str).collect();
        assert_eq!(nonterminals, vec!["A", "S"]);
        let terminals: Vec<String> = automaton.terminals().into_iter().collect();
        assert_eq!(terminals, vec!["a", "b", "c"]);
        assert_eq!(automaton.states().len(), 4);
        assert_eq!(automaton.rules().len(), 5);
    }

    #[test]
    fn test_add_rule_returns_index() {
        let mut automaton = Automaton::new(2, "s", "S").unwrap();
        assert_eq!(automaton.add_rule(1, "s", "S", "f", ["a"]).unwrap(), 1);
        assert_eq!(automaton.add_rule(1, "s", "S", "f", ["b"]).unwrap(), 2);
        assert!(matches!(
            automaton.add_rule(0, "s", "S", "f", ["c"]),
            Err(DpdaError::InvalidRule(_))
        ));
        assert_eq!(automaton.rules().len(), 2);
        assert_eq!(automaton.rule(2).unwrap().replacement, vec!["b"]);
        assert!(matches!(automaton.rule(0), Err(DpdaError::UnknownRule { index: 0, count: 2 })));
    }

    #[test]
    fn test_compile_is_idempotent() {
        let automaton = abc_automaton();
        let first = automaton.compile();
        let second = automaton.compile();
        assert_eq!(first.rules(), second.rules());
        assert_eq!(first.rule(4).unwrap().nonterminal_count, 1);
        assert_eq!(first.rule(1).unwrap().nonterminal_count, 2);
    }

    #[test]
    fn test_rules_added_after_compile_need_recompile() {
        let mut automaton = Automaton::new(3, "s", "S").unwrap().with_accepting_states(["f"]);
        automaton.add_rule(1, "s", "S", "f", ["B"]).unwrap();
        let stale = automaton.compile();
        // B only becomes a nonterminal once a rule expands it.
        assert!(stale.rule(1).unwrap().replacement[0].is_terminal());

        automaton.add_rule(1, "f", "B", "f", ["b"]).unwrap();
        let fresh = automaton.compile();
        assert!(fresh.rule(1).unwrap().replacement[0].is_pending());
        assert_eq!(stale.rules().len(), 1);
        assert!(fresh.simulate("b", &[1, 2]).unwrap());
        assert!(matches!(stale.simulate("b", &[1, 2]), Err(DpdaError::UnknownRule { index: 2, .. })));
    }

    #[test]
    fn test_accepts_with_deep_expansion() {
        let automaton = abc_automaton();
        assert!(automaton.simulate("aabbcc", &[1, 4, 5, 2, 3]).unwrap());
        assert!(automaton.simulate("abc", &[1, 2, 3]).unwrap());
    }

    #[test]
    fn test_rejections() {
        let compiled = abc_automaton().compile();

        let verdict = compiled.run(&["a", "b", "x"], &[1, 2, 3], &mut NoopObserver).unwrap();
        assert_eq!(
            verdict,
            Verdict::Rejected(Rejection::InputMismatch {
                position: 2,
                expected: "x".to_string(),
                found: Some("c".to_string()),
            })
        );

        let verdict = compiled.run(&["a", "b", "c"], &[1, 3], &mut NoopObserver).unwrap();
        assert!(matches!(verdict, Verdict::Rejected(Rejection::StateMismatch { step: 2, rule: 3, .. })));

        let verdict = compiled.run(&["a", "b"], &[1, 2], &mut NoopObserver).unwrap();
        assert!(matches!(verdict, Verdict::Rejected(Rejection::IncompleteExpansion { .. })));

        let verdict = compiled.run(&["a", "b"], &[1, 2, 3], &mut NoopObserver).unwrap();
        assert_eq!(
            verdict,
            Verdict::Rejected(Rejection::ResidualTape { remaining: vec!["c".to_string()] })
        );

        // Longer input than tape: the drain runs into the bottom marker.
        let verdict = compiled.run(&["a", "b", "c", "c"], &[1, 2, 3], &mut NoopObserver).unwrap();
        assert_eq!(
            verdict,
            Verdict::Rejected(Rejection::InputMismatch {
                position: 3,
                expected: "c".to_string(),
                found: Some("#".to_string()),
            })
        );
    }

    #[test]
    fn test_symbol_mismatch_and_out_of_range_depth() {
        let mut automaton = Automaton::new(3, "s", "S").unwrap().with_accepting_states(["f"]);
        automaton.add_rule(1, "s", "S", "s", ["A", "B"]).unwrap();
        automaton.add_rule(1, "s", "B", "s", ["b"]).unwrap();
        automaton.add_rule(1, "s", "A", "s", ["a"]).unwrap();
        automaton.add_rule(3, "s", "A", "s", ["a"]).unwrap();
        let compiled = automaton.compile();

        let verdict = compiled.run(&["b"], &[1, 2], &mut NoopObserver).unwrap();
        assert_eq!(
            verdict,
            Verdict::Rejected(Rejection::SymbolMismatch {
                step: 2,
                rule: 2,
                expected: Symbol::nonterminal("B"),
                found: Symbol::nonterminal("A"),
            })
        );

        assert_eq!(
            compiled.run(&["a"], &[1, 3, 4], &mut NoopObserver),
            Err(DpdaError::DepthOutOfRange { depth: 3, pending: 2 })
        );
    }

    #[test]
    fn test_depth_beyond_initial_pushdown_is_an_error() {
        let mut automaton = Automaton::new(3, "s", "S").unwrap().with_accepting_states(["f"]);
        automaton.add_rule(3, "s", "S", "f", ["a"]).unwrap();
        assert_eq!(
            automaton.simulate("a", &[1]),
            Err(DpdaError::DepthOutOfRange { depth: 3, pending: 2 })
        );
    }

    #[test]
    fn test_non_accepting_state() {
        let mut automaton = Automaton::new(2, "s", "S").unwrap().with_accepting_states(["f"]);
        automaton.add_rule(1, "s", "S", "q", ["a"]).unwrap();
        let verdict = automaton.compile().run(&["a"], &[1], &mut NoopObserver).unwrap();
        assert_eq!(
            verdict,
            Verdict::Rejected(Rejection::NonAcceptingState { state: "q".to_string() })
        );
    }

    #[test]
    fn test_depth_bound_rejects_before_mutation() {
        let mut automaton = Automaton::new(1, "s", "S").unwrap().with_accepting_states(["s"]);
        automaton.add_rule(1, "s", "S", "s", ["A", "A"]).unwrap();
        automaton.add_rule(1, "s", "A", "s", ["a"]).unwrap();
        let verdict = automaton.compile().run(&["a", "a"], &[1, 2, 2], &mut NoopObserver).unwrap();
        assert_eq!(
            verdict,
            Verdict::Rejected(Rejection::DepthBoundExceeded { step: 1, rule: 1, pending: 3, bound: 1 })
        );
    }

    #[test]
    fn test_pending_count_follows_rule_counts() {
        let compiled = abc_automaton().compile();
        let derivation = [1, 4, 5, 2, 3];
        let mut events: Vec<StepEvent> = Vec::new();
        let verdict = compiled.run(&["a", "a", "b", "b", "c", "c"], &derivation, &mut events).unwrap();
        assert!(verdict.is_accepted());
        assert_eq!(events.len(), derivation.len());

        let mut expected = 2;
        for event in &events {
            let rule = compiled.rule(event.rule).unwrap();
            expected = expected + rule.nonterminal_count - 1;
            assert_eq!(event.pending_after, expected);
            assert!(event.pending_after <= compiled.automaton().n());
        }
        assert_eq!(events[2].tape, vec!["a", "A", "b", "A", "c", "#"]);
        assert_eq!(events.last().unwrap().to_state, "f");
    }

    #[test]
    fn test_unknown_rule_is_an_error() {
        let compiled = abc_automaton().compile();
        assert_eq!(
            compiled.simulate("abc", &[1, 9]).unwrap_err(),
            DpdaError::UnknownRule { index: 9, count: 5 }
        );
        assert!(compiled.simulate("abc", &[0]).is_err());
    }

    #[test]
    fn test_bottom_rule_appends_before_marker() {
        let mut automaton = Automaton::new(2, "s", "S").unwrap().with_accepting_states(["f"]);
        automaton.add_rule(1, "s", "S", "q", ["a"]).unwrap();
        automaton.add_rule(1, "q", "#", "f", ["b", "#"]).unwrap();
        let compiled = automaton.compile();
        assert!(compiled.simulate("ab", &[1, 2]).unwrap());
        assert!(!compiled.simulate("a", &[1, 2]).unwrap());
        assert!(!compiled.simulate("ab", &[2, 1]).unwrap());
    }
}
