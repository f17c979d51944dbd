pub mod error;
pub mod symbol;
pub mod rule;
pub mod stack;
pub mod trace;
pub mod automaton;
pub mod reduce;

// Export core types for anyone importing the pushdown module
pub use crate::pushdown::error::{DpdaError, Result};
pub use crate::pushdown::symbol::{Symbol, SymbolKind, BOTTOM_MARKER};
pub use crate::pushdown::rule::{CompiledRule, Rule};
pub use crate::pushdown::stack::DepthStack;
pub use crate::pushdown::trace::{LogObserver, NoopObserver, StepEvent, TraceObserver};
pub use crate::pushdown::automaton::{Automaton, CompiledAutomaton, Rejection, Verdict};
pub use crate::pushdown::reduce::{reduce, AlphabetReducer, GENERIC_NONTERMINAL};
