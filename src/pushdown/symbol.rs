use std::fmt;
use serde::{Serialize, Deserialize};

/// Reserved name of the bottom-of-pushdown marker.
pub const BOTTOM_MARKER: &str = "#";

/// Kind of a pushdown alphabet element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SymbolKind {
    /// Input symbol, matched against the input during the drain phase.
    Terminal,
    /// Expandable (non-input) symbol.
    Nonterminal,
    /// The sentinel at the base of the pushdown.
    Bottom,
}

impl SymbolKind {
    /// Nonterminals and the bottom marker both occupy a slot in the pending index.
    pub fn is_pending(&self) -> bool {
        matches!(self, SymbolKind::Nonterminal | SymbolKind::Bottom)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SymbolKind::Terminal => "terminal",
            SymbolKind::Nonterminal => "nonterminal",
            SymbolKind::Bottom => "bottom",
        };
        f.write_str(label)
    }
}

/// A pushdown symbol. Equality and hashing are structural over `(kind, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
}

impl Symbol {
    /// Create a new terminal symbol.
    pub fn terminal(name: impl Into<String>) -> Self {
        Self { kind: SymbolKind::Terminal, name: name.into() }
    }

    /// Create a new nonterminal symbol.
    pub fn nonterminal(name: impl Into<String>) -> Self {
        Self { kind: SymbolKind::Nonterminal, name: name.into() }
    }

    /// The bottom marker. Every automaton shares this one value.
    pub fn bottom() -> Self {
        Self { kind: SymbolKind::Bottom, name: BOTTOM_MARKER.to_string() }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind == SymbolKind::Terminal
    }

    pub fn is_bottom(&self) -> bool {
        self.kind == SymbolKind::Bottom
    }

    /// True for symbols tracked by the pending index (nonterminals and bottom).
    pub fn is_pending(&self) -> bool {
        self.kind.is_pending()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
