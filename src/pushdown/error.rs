use thiserror::Error;

/// Errors that signal misuse of the automaton API.
///
/// A wrong derivation is never reported through this type: rejections are
/// ordinary values (see [`crate::pushdown::Rejection`]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DpdaError {
    /// A pending-index lookup asked for a depth that does not exist.
    #[error("depth {depth} is out of range: {pending} pending symbol(s) on the pushdown")]
    DepthOutOfRange { depth: usize, pending: usize },

    /// A derivation referenced a rule index that was never registered.
    #[error("rule {index} does not exist: the automaton has {count} rule(s)")]
    UnknownRule { index: usize, count: usize },

    /// A rule registration was malformed.
    #[error("invalid rule: {0}")]
    InvalidRule(String),

    /// The automaton itself was constructed with invalid parameters.
    #[error("invalid automaton: {0}")]
    InvalidAutomaton(String),
}

pub type Result<T> = std::result::Result<T, DpdaError>;
