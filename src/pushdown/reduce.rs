//! Reduction of an nDPDA to an equivalent one whose pushdown alphabet is
//! `{#, $}`.
//!
//! The names of all pending nonterminals are folded into the state: a reduced
//! state `<q;u1,..,A,..,z1>` means "control state `q`, pending nonterminals
//! `u A z` from the top down". Each source rule `m q A -> p v` becomes one
//! reduced rule per possible context `(u, z)` with `|u| = m - 1` and
//! `|z| <= n - m - 1`.

use crate::pushdown::automaton::{Automaton, CompiledAutomaton};
use crate::pushdown::error::{DpdaError, Result};
use crate::pushdown::rule::{CompiledRule, Rule};
use crate::pushdown::symbol::{SymbolKind, BOTTOM_MARKER};
use rayon::prelude::*;
use std::ops::RangeInclusive;

/// Name of the only nonterminal of a reduced automaton.
pub const GENERIC_NONTERMINAL: &str = "$";

// Separators of the encoded state `<q;A,B>`. Nonterminal names may not
// contain them, so the pending list after the last ';' decodes uniquely.
const STATE_SEPARATOR: &str = ";";
const NAME_SEPARATOR: &str = ",";

/// A hypothesised stack context around the expanded symbol: the pending
/// nonterminals strictly above it and strictly below it, top first.
#[derive(Debug, Clone)]
struct ReducedRuleContext<'a> {
    above: Vec<&'a str>,
    below: Vec<&'a str>,
}

/// Rewrites a compiled automaton into its reduced form.
#[derive(Debug)]
pub struct AlphabetReducer<'a> {
    source: &'a CompiledAutomaton,
    // Source nonterminal names in a stable (sorted) order.
    alphabet: Vec<&'a str>,
}

impl<'a> AlphabetReducer<'a> {
    pub fn new(source: &'a CompiledAutomaton) -> Result<Self> {
        let automaton = source.automaton();
        if automaton.nonterminals().contains(GENERIC_NONTERMINAL)
            || automaton.terminals().contains(GENERIC_NONTERMINAL)
        {
            return Err(DpdaError::InvalidAutomaton(format!(
                "'{}' is reserved for the reduced alphabet",
                GENERIC_NONTERMINAL
            )));
        }
        if let Some(name) = automaton
            .nonterminals()
            .iter()
            .find(|name| name.contains(STATE_SEPARATOR) || name.contains(NAME_SEPARATOR))
        {
            return Err(DpdaError::InvalidAutomaton(format!(
                "nonterminal '{}' contains '{}' or '{}', which encode reduced states",
                name, STATE_SEPARATOR, NAME_SEPARATOR
            )));
        }
        // BTreeSet iteration keeps the alphabet sorted, which `rank` relies on.
        let alphabet = automaton.nonterminals().iter().map(String::as_str).collect();
        Ok(AlphabetReducer { source, alphabet })
    }

    /// Builds the reduced automaton.
    ///
    /// Rules come out grouped by source rule, in source order; within a
    /// group the contexts are ordered by `u`, then by `z` (shorter first,
    /// lexicographic in the alphabet order).
    pub fn reduce(&self) -> Result<Automaton> {
        let automaton = self.source.automaton();
        let groups = self
            .source
            .rules()
            .par_iter()
            .map(|rule| self.rewrite(rule))
            .collect::<Result<Vec<Vec<Rule>>>>()?;

        let start_state = encode_state(automaton.start_state(), &[automaton.start_symbol()]);
        // Only encoded states are accepting; a raw source state name could
        // coincide with an encoded one.
        let mut reduced = Automaton::new(automaton.n(), start_state, GENERIC_NONTERMINAL)?;

        for (group, source_rule) in groups.into_iter().zip(self.source.rules()) {
            let accepting = automaton.accepting_states().contains(&source_rule.rule.to_state);
            for rule in group {
                if accepting {
                    reduced.add_accepting_state(rule.to_state.clone());
                }
                reduced.push_rule(rule);
            }
        }

        log::info!(
            "Reduced {} rules over {} nonterminals into {} rules and {} states",
            automaton.rules().len(),
            self.alphabet.len(),
            reduced.rules().len(),
            reduced.states().len()
        );
        Ok(reduced)
    }

    /// Translates a source derivation into the matching reduced derivation.
    ///
    /// Returns `Ok(None)` when the source automaton would reject the
    /// derivation (wrong state, wrong symbol, or beyond the bound), in which
    /// case no reduced counterpart exists either. Like simulation, an
    /// unknown rule index or a depth beyond the pending symbols is an error.
    pub fn translate(&self, derivation: &[usize]) -> Result<Option<Vec<usize>>> {
        let automaton = self.source.automaton();
        let offsets = self.group_offsets();
        let mut state = automaton.start_state().to_string();
        // Pending nonterminal names, top first, bottom excluded.
        let mut pending = vec![automaton.start_symbol().to_string()];
        let mut translated = Vec::with_capacity(derivation.len());

        for &index in derivation {
            let compiled = self.source.rule(index)?;
            let rule = &compiled.rule;
            let m = rule.depth;
            if rule.from_state != state {
                return Ok(None);
            }

            // Counts include the bottom marker.
            let pending_count = pending.len() + 1;
            if pending_count + compiled.nonterminal_count - 1 > automaton.n() {
                return Ok(None);
            }
            if m > pending_count {
                return Err(DpdaError::DepthOutOfRange { depth: m, pending: pending_count });
            }

            let (above, below) = if rule.is_bottom_rule() {
                if m != pending_count {
                    return Ok(None);
                }
                (&pending[..], &pending[pending.len()..])
            } else {
                if m == pending_count || pending[m - 1] != rule.from_symbol.name {
                    return Ok(None);
                }
                (&pending[..m - 1], &pending[m..])
            };

            let Some(position) = self.context_position(rule, above, below) else {
                return Ok(None);
            };
            translated.push(offsets[index - 1] + position + 1);

            let produced = compiled.nonterminal_names().map(str::to_string);
            if rule.is_bottom_rule() {
                pending.extend(produced);
            } else {
                pending.splice(m - 1..m, produced);
            }
            state = rule.to_state.clone();
        }

        Ok(Some(translated))
    }

    /// Lengths of the context below the expanded symbol. `None` when the
    /// rule can never fire within the bound and so has no reduced rules.
    fn below_lengths(&self, rule: &Rule) -> Option<RangeInclusive<usize>> {
        let n = self.source.automaton().n();
        if rule.is_bottom_rule() {
            // Nothing lies below the bottom marker.
            (rule.depth <= n).then_some(0..=0)
        } else {
            n.checked_sub(rule.depth + 1).map(|longest| 0..=longest)
        }
    }

    /// Number of words of `length` symbols over the alphabet.
    fn word_count(&self, length: usize) -> usize {
        u32::try_from(length).map_or(usize::MAX, |exp| self.alphabet.len().saturating_pow(exp))
    }

    /// Number of reduced rules emitted for a source rule.
    fn context_count(&self, rule: &Rule) -> usize {
        match self.below_lengths(rule) {
            Some(lengths) => {
                let below: usize = lengths.map(|len| self.word_count(len)).fold(0, usize::saturating_add);
                self.word_count(rule.depth - 1).saturating_mul(below)
            }
            None => 0,
        }
    }

    /// Position of a word in the lexicographic enumeration of its length.
    fn rank<S: AsRef<str>>(&self, word: &[S]) -> Option<usize> {
        word.iter().try_fold(0usize, |acc, name| {
            let digit = self
                .alphabet
                .binary_search_by(|candidate| (*candidate).cmp(name.as_ref()))
                .ok()?;
            Some(acc * self.alphabet.len() + digit)
        })
    }

    /// Position of a context within the group of a rule, matching the
    /// order in which `contexts` emits them.
    fn context_position<S: AsRef<str>>(&self, rule: &Rule, above: &[S], below: &[S]) -> Option<usize> {
        let lengths = self.below_lengths(rule)?;
        if !lengths.contains(&below.len()) {
            return None;
        }
        let below_total: usize = lengths.clone().map(|len| self.word_count(len)).fold(0, usize::saturating_add);
        let shorter: usize = (*lengths.start()..below.len()).map(|len| self.word_count(len)).sum();
        Some(self.rank(above)? * below_total + shorter + self.rank(below)?)
    }

    /// All contexts a rule has to be specialised for, in emission order.
    fn contexts(&self, rule: &Rule) -> Vec<ReducedRuleContext<'a>> {
        let Some(lengths) = self.below_lengths(rule) else {
            return Vec::new();
        };
        let above = words(&self.alphabet, rule.depth - 1);
        let below: Vec<Vec<&'a str>> = lengths.flat_map(|len| words(&self.alphabet, len)).collect();

        above
            .iter()
            .flat_map(|u| {
                below.iter().map(move |z| ReducedRuleContext {
                    above: u.clone(),
                    below: z.clone(),
                })
            })
            .collect()
    }

    /// Emits the reduced rules of one source rule.
    fn rewrite(&self, compiled: &CompiledRule) -> Result<Vec<Rule>> {
        let rule = &compiled.rule;
        let (special, expanded) = if rule.is_bottom_rule() {
            (BOTTOM_MARKER, None)
        } else {
            (GENERIC_NONTERMINAL, Some(rule.from_symbol.name.as_str()))
        };
        let produced: Vec<&str> = compiled.nonterminal_names().collect();
        let replacement: Vec<String> = compiled
            .replacement
            .iter()
            .map(|symbol| match symbol.kind {
                SymbolKind::Nonterminal => GENERIC_NONTERMINAL.to_string(),
                _ => symbol.name.clone(),
            })
            .collect();

        self.contexts(rule)
            .into_iter()
            .map(|ReducedRuleContext { above, below }| {
                let before: Vec<&str> = above.iter().copied().chain(expanded).chain(below.iter().copied()).collect();
                let after: Vec<&str> = above
                    .iter()
                    .chain(produced.iter())
                    .chain(below.iter())
                    .copied()
                    .collect();
                Rule::new(
                    rule.depth,
                    encode_state(&rule.from_state, &before),
                    special,
                    encode_state(&rule.to_state, &after),
                    replacement.clone(),
                )
            })
            .collect()
    }

    /// Index of the first reduced rule of every source rule's group.
    fn group_offsets(&self) -> Vec<usize> {
        let mut offset = 0usize;
        self.source
            .rules()
            .iter()
            .map(|compiled| {
                let start = offset;
                offset = offset.saturating_add(self.context_count(&compiled.rule));
                start
            })
            .collect()
    }
}

/// Convenience wrapper around [`AlphabetReducer::reduce`].
pub fn reduce(source: &CompiledAutomaton) -> Result<Automaton> {
    AlphabetReducer::new(source)?.reduce()
}

/// Reduced state name for control state `state` with `pending` on the
/// pushdown, top first.
fn encode_state(state: &str, pending: &[&str]) -> String {
    format!(
        "<{}{}{}>",
        state,
        STATE_SEPARATOR,
        pending.join(NAME_SEPARATOR)
    )
}

/// Every sequence of exactly `length` symbols over `alphabet`, in
/// lexicographic order of the alphabet.
fn words<'a>(alphabet: &[&'a str], length: usize) -> Vec<Vec<&'a str>> {
    let mut words = vec![Vec::new()];
    for _ in 0..length {
        words = words
            .iter()
            .flat_map(|prefix| {
                alphabet.iter().map(move |symbol| {
                    let mut word = prefix.clone();
                    word.push(*symbol);
                    word
                })
            })
            .collect();
    }
    words
}
