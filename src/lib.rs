// Declare the library modules
pub mod analysis;
pub mod args;
pub mod config;
pub mod io;
pub mod pushdown;

// Re-export the core types for easier access
pub use pushdown::{reduce, AlphabetReducer, Automaton, CompiledAutomaton, DepthStack, DpdaError, Symbol};
