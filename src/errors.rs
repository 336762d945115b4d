//! Error taxonomy for the automaton definition and code-generation toolkit.
//!
//! Errors are grouped by origin: definition errors raised
//! by the builder, analysis errors raised once a frozen automaton is
//! inspected, encoding errors raised by the charset codec, and boundary
//! errors raised by emitter plumbing (file I/O, external `dot` invocation).
//! Nothing here is retried or recovered internally; every variant carries
//! enough context (names, offending characters) to diagnose the failure at
//! the call site.

use thiserror::Error;

use crate::charset::CharSet;

/// Errors raised while declaring actions, states, and transitions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// An action with this name was already declared.
    #[error("action `{0}` already declared")]
    DuplicateAction(String),

    /// A state with this name was already declared.
    #[error("state `{0}` already declared")]
    DuplicateState(String),

    /// An action was declared after at least one state, which is forbidden.
    #[error("action `{0}` declared after a state; actions must precede states")]
    LateAction(String),

    /// A state-level default transition was registered twice for one state.
    #[error("state `{0}` already has a default transition")]
    DuplicateDefault(String),

    /// The machine-wide default transition was registered twice.
    #[error("machine-wide default transition already set")]
    DuplicateMachineDefault,

    /// An explicit transition key overlaps one already registered on the
    /// same state. Carries the overlapping code points.
    #[error("transition on state `{state}` overlaps an existing transition at {overlap}")]
    OverlappingTransition {
        /// The state the new transition was being added to.
        state: String,
        /// The intersection between the new key and an existing key.
        overlap: CharSet,
    },

    /// A transition's action sequence was not strictly increasing by
    /// `order_key`.
    #[error("action `{0}` is out of order in this transition")]
    ActionOutOfOrder(String),

    /// A transition named an action that was never declared.
    #[error("action `{0}` was never declared")]
    UndefinedAction(String),

    /// A transition key was neither a valid character set nor `default`.
    #[error("invalid transition key")]
    InvalidKey,

    /// The automaton was mutated after analysis had already started.
    #[error("automaton is frozen; no further mutation is allowed")]
    Frozen,
}

/// Errors raised while analyzing an already-frozen automaton.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// A transition named a state that was never declared (and is not the
    /// implicit `error` sink).
    #[error("state `{0}` is referenced but was never declared")]
    UnknownState(String),

    /// Two distinct declared names sanitized to the same C identifier.
    #[error("identifier `{0}` is claimed by more than one declared name")]
    NameCollision(String),
}

/// Errors raised by the charset codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The input bytes did not form a valid code point under the requested
    /// encoding.
    #[error("invalid encoding in input")]
    InvalidEncoding,
}

/// Errors raised by emitter boundary plumbing: writing files or shelling
/// out to `dot`. Emission over a model that has already passed analysis
/// cannot fail for any other reason.
#[derive(Debug, Error)]
pub enum EmitError {
    /// Writing generated output failed.
    #[error("I/O error while emitting: {0}")]
    Io(#[from] std::io::Error),

    /// The external `dot` tool could not be run or exited unsuccessfully.
    #[error("external tool failed: {0}")]
    ExternalToolFailed(String),

    /// Writing to the caller-supplied sink failed.
    #[error("formatting error while emitting: {0}")]
    Format(#[from] std::fmt::Error),
}
