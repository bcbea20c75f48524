//! Error types for vocab-core.

use thiserror::Error;

/// Result type alias using ParseError.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors that can occur while parsing a word list.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("missing term at line {line}")]
    MissingTerm { line: usize },

    #[error("missing definition at line {line}")]
    MissingDefinition { line: usize },
}

/// An event arrived in a mode that does not accept it.
///
/// The session state is left untouched, so a duplicate or late event is inert.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("event {event} ignored in mode {mode}")]
    Ignored {
        event: &'static str,
        mode: &'static str,
    },
}
