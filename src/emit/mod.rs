//! Emitters that consume an analyzed automaton and produce text: a C++
//! streaming parser ([`cpp`]) or a Graphviz `dot` graph ([`dot`]).
//!
//! Both emitters are pure string assembly over `impl std::fmt::Write`; the
//! only place either touches a filesystem or a subprocess is the small
//! convenience methods `CppEmitter::generate_to_files` and
//! `DotEmitter::render_with_dot`.

pub mod cpp;
pub mod dot;

pub use cpp::{CppEmitOptions, CppEmitter};
pub use dot::{DotEmitOptions, DotEmitter};
