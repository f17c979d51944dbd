use crate::pushdown::error::{DpdaError, Result};
use crate::pushdown::symbol::{Symbol, SymbolKind, BOTTOM_MARKER};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// An expansion rule `m q A -> p v`.
///
/// The replacement is kept as raw names until the owning automaton is
/// compiled, because whether a name is a nonterminal depends on the whole
/// rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub depth: usize,
    pub from_state: String,
    pub from_symbol: Symbol, // Nonterminal, or the bottom marker
    pub to_state: String,
    pub replacement: Vec<String>,
}

impl Rule {
    /// Creates a validated rule. `from_symbol` equal to `#` makes this a
    /// bottom rule.
    pub fn new(
        depth: usize,
        from_state: impl Into<String>,
        from_symbol: &str,
        to_state: impl Into<String>,
        replacement: Vec<String>,
    ) -> Result<Self> {
        if depth == 0 {
            return Err(DpdaError::InvalidRule("depth must be at least 1".to_string()));
        }
        if from_symbol.is_empty() {
            return Err(DpdaError::InvalidRule("expanded symbol has an empty name".to_string()));
        }
        if replacement.iter().any(|name| name.is_empty()) {
            return Err(DpdaError::InvalidRule(format!(
                "replacement of {} contains an empty symbol name",
                from_symbol
            )));
        }

        let bottom_count = replacement.iter().filter(|name| name.as_str() == BOTTOM_MARKER).count();
        let from_symbol = if from_symbol == BOTTOM_MARKER {
            // The marker must stay the deepest symbol of the pushdown.
            let ends_with_bottom = replacement.last().map(String::as_str) == Some(BOTTOM_MARKER);
            if bottom_count != 1 || !ends_with_bottom {
                return Err(DpdaError::InvalidRule(format!(
                    "a bottom rule must end its replacement with exactly one '{}'",
                    BOTTOM_MARKER
                )));
            }
            Symbol::bottom()
        } else {
            if bottom_count > 0 {
                return Err(DpdaError::InvalidRule(format!(
                    "only a bottom rule may produce '{}' (rule expands {})",
                    BOTTOM_MARKER, from_symbol
                )));
            }
            Symbol::nonterminal(from_symbol)
        };

        Ok(Rule {
            depth,
            from_state: from_state.into(),
            from_symbol,
            to_state: to_state.into(),
            replacement,
        })
    }

    pub fn is_bottom_rule(&self) -> bool {
        self.from_symbol.is_bottom()
    }

    /// Resolves the raw replacement names against the known nonterminals.
    pub fn resolve(&self, nonterminals: &BTreeSet<String>) -> CompiledRule {
        let replacement: Vec<Symbol> = self
            .replacement
            .iter()
            .map(|name| {
                if name == BOTTOM_MARKER {
                    Symbol::bottom()
                } else if nonterminals.contains(name) {
                    Symbol::nonterminal(name.as_str())
                } else {
                    Symbol::terminal(name.as_str())
                }
            })
            .collect();
        let nonterminal_count = replacement.iter().filter(|s| s.is_pending()).count();

        CompiledRule {
            rule: self.clone(),
            replacement,
            nonterminal_count,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} -> {} {}",
            self.depth,
            self.from_state,
            self.from_symbol,
            self.to_state,
            self.replacement.join(" ")
        )
    }
}

/// A rule whose replacement has been classified into symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRule {
    pub rule: Rule,
    pub replacement: Vec<Symbol>,
    // Nonterminals plus bottom markers in the replacement.
    pub nonterminal_count: usize,
}

impl CompiledRule {
    /// Names of the replacement's nonterminals, bottom excluded, in order.
    pub fn nonterminal_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.replacement
            .iter()
            .filter(|s| s.kind == SymbolKind::Nonterminal)
            .map(|s| s.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rule_creation() {
        let rule = Rule::new(2, "p", "A", "q", names(&["A", "c"])).unwrap();
        assert_eq!(rule.depth, 2);
        assert_eq!(rule.from_symbol, Symbol::nonterminal("A"));
        assert!(!rule.is_bottom_rule());
        assert_eq!(rule.to_string(), "2 p A -> q A c");
    }

    #[test]
    fn test_malformed_rules() {
        assert!(matches!(
            Rule::new(0, "q", "A", "p", names(&["a"])),
            Err(DpdaError::InvalidRule(_))
        ));
        assert!(matches!(
            Rule::new(1, "q", "", "p", names(&["a"])),
            Err(DpdaError::InvalidRule(_))
        ));
        assert!(matches!(
            Rule::new(1, "q", "A", "p", names(&["a", ""])),
            Err(DpdaError::InvalidRule(_))
        ));
        assert!(matches!(
            Rule::new(1, "q", "A", "p", names(&["a", "#"])),
            Err(DpdaError::InvalidRule(_))
        ));
        assert!(matches!(
            Rule::new(1, "q", "#", "p", names(&["#", "a"])),
            Err(DpdaError::InvalidRule(_))
        ));
        assert!(matches!(
            Rule::new(1, "q", "#", "p", Vec::new()),
            Err(DpdaError::InvalidRule(_))
        ));
    }

    #[test]
    fn test_bottom_rule() {
        let rule = Rule::new(1, "q", "#", "f", names(&["x", "#"])).unwrap();
        assert!(rule.is_bottom_rule());
        let compiled = rule.resolve(&BTreeSet::new());
        assert_eq!(compiled.replacement, vec![Symbol::terminal("x"), Symbol::bottom()]);
        assert_eq!(compiled.nonterminal_count, 1);
        assert_eq!(compiled.nonterminal_names().count(), 0);
    }

    #[test]
    fn test_resolve_classifies_names() {
        let known: BTreeSet<String> = ["A".to_string()].into_iter().collect();
        let rule = Rule::new(1, "q", "A", "p", names(&["a", "A", "b"])).unwrap();
        let compiled = rule.resolve(&known);
        assert_eq!(
            compiled.replacement,
            vec![Symbol::terminal("a"), Symbol::nonterminal("A"), Symbol::terminal("b")]
        );
        assert_eq!(compiled.nonterminal_count, 1);
        assert_eq!(compiled.nonterminal_names().collect::<Vec<_>>(), vec!["A"]);
    }
}
