//! A finite-automaton definition-and-code-generation toolkit.
//!
//! A user describes a deterministic finite state machine declaratively
//! through the [`automaton::Automaton`] builder — naming actions, states,
//! and character-triggered transitions — then calls
//! [`automaton::Automaton::freeze`] and builds an [`analyzer::Analyzer`]
//! over it, which the two emitters in [`emit`] consume to produce a
//! streaming C++ parser and a Graphviz state diagram.
//!
//! The crate is organized the way its core algorithm is: a codec at the
//! bottom ([`charset`]), a typed data model on top of it ([`automaton`]),
//! an analysis layer that collapses and resolves that model
//! ([`partition`], [`analyzer`]), and a pair of thin emitters consuming the
//! analysis ([`emit`]). Nothing in the library touches a filesystem or a
//! subprocess except the two convenience methods
//! [`emit::CppEmitter::generate_to_files`] and
//! [`emit::DotEmitter::render_with_dot`].

pub mod analyzer;
pub mod automaton;
pub mod charset;
pub mod emit;
pub mod errors;
pub mod partition;

pub use analyzer::Analyzer;
pub use automaton::Automaton;
pub use charset::CharSet;
pub use partition::Partitioner;
