//! Graphviz `dot` emitter.
//!
//! Consumes the [`Automaton`] model directly — it has no dependency on the
//! [`Partitioner`](crate::partition::Partitioner) or [`Analyzer`], since a
//! state diagram is drawn from the declared transitions as-is, not from the
//! collapsed character-class table.

use std::collections::HashMap;
use std::io::Write as _;
use std::process::{Command, Stdio};

use crate::automaton::Automaton;
use crate::charset::pretty;
use crate::errors::EmitError;

/// Customization hooks for [`DotEmitter`]: graph-wide attributes,
/// default-node attributes, and per-state overrides.
#[derive(Debug, Clone, Default)]
pub struct DotEmitOptions {
    /// Extra `key=value` pairs applied to the graph itself.
    pub graph_attrs: Vec<(String, String)>,
    /// Extra `key=value` pairs applied via a default `node [...]` statement.
    pub node_attrs: Vec<(String, String)>,
    /// Extra `key=value` pairs applied via a default `edge [...]` statement.
    pub edge_attrs: Vec<(String, String)>,
    /// Per-state attribute overrides, keyed by declared state name.
    pub state_attrs: HashMap<String, Vec<(String, String)>>,
    /// Verbatim text inserted after the graph header, before any node or
    /// edge statement (e.g. a prefatory subgraph).
    pub preamble: Option<String>,
}

/// Emits a state diagram for an [`Automaton`].
pub struct DotEmitter;

impl DotEmitter {
    fn escape(text: &str) -> String {
        text.replace('\\', "\\\\").replace('"', "\\\"")
    }

    fn attr_list(attrs: &[(String, String)]) -> String {
        attrs
            .iter()
            .map(|(k, v)| format!("{k}=\"{}\"", Self::escape(v)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Writes the `digraph { ... }` source for `automaton` to `out`.
    pub fn write(
        automaton: &Automaton,
        options: &DotEmitOptions,
        out: &mut impl std::fmt::Write,
    ) -> Result<(), EmitError> {
        writeln!(out, "digraph {{")?;
        writeln!(out, "    rankdir=LR;")?;
        for (k, v) in &options.graph_attrs {
            writeln!(out, "    {k}=\"{}\";", Self::escape(v))?;
        }
        if !options.node_attrs.is_empty() {
            writeln!(out, "    node [{}];", Self::attr_list(&options.node_attrs))?;
        }
        if !options.edge_attrs.is_empty() {
            writeln!(out, "    edge [{}];", Self::attr_list(&options.edge_attrs))?;
        }
        if let Some(preamble) = &options.preamble {
            writeln!(out, "{preamble}")?;
        }

        writeln!(out, "    __start [shape=point, style=invis];")?;
        if let Some(start) = automaton.start_state() {
            writeln!(out, "    __start -> \"{}\";", Self::escape(start))?;
        }

        for state in automaton.states() {
            let shape = if state.is_final() { "doublecircle" } else { "circle" };
            let mut attrs = vec![("shape".to_string(), shape.to_string())];
            if let Some(overrides) = options.state_attrs.get(state.name()) {
                attrs.extend(overrides.iter().cloned());
            }
            writeln!(
                out,
                "    \"{}\" [{}];",
                Self::escape(state.name()),
                Self::attr_list(&attrs)
            )?;
        }

        for state in automaton.states() {
            for (key, transition) in state.explicit_transitions() {
                let charset_text = pretty(key);
                let charset_text = charset_text.trim_matches('"');
                let label = format!(
                    "{}\\n{}",
                    Self::escape(charset_text),
                    Self::escape(&transition.actions().join(","))
                );
                writeln!(
                    out,
                    "    \"{}\" -> \"{}\" [label=\"{}\"];",
                    Self::escape(state.name()),
                    Self::escape(transition.end_state()),
                    label
                )?;
            }
            if let Some(transition) = state.default_transition() {
                let label = format!("other\\n{}", Self::escape(&transition.actions().join(",")));
                writeln!(
                    out,
                    "    \"{}\" -> \"{}\" [label=\"{}\"];",
                    Self::escape(state.name()),
                    Self::escape(transition.end_state()),
                    label
                )?;
            }
        }

        writeln!(out, "}}")?;
        Ok(())
    }

    /// Renders `automaton` to `dot` source, then pipes it through the given
    /// `dot` binary and returns its stdout (e.g. a PNG or SVG).
    ///
    /// # Errors
    ///
    /// Fails [`EmitError::ExternalToolFailed`] if the binary cannot be
    /// spawned or exits unsuccessfully.
    pub fn render_with_dot(
        automaton: &Automaton,
        options: &DotEmitOptions,
        dot_binary: &str,
    ) -> Result<Vec<u8>, EmitError> {
        let mut source = String::new();
        Self::write(automaton, options, &mut source)?;

        let mut child = Command::new(dot_binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| EmitError::ExternalToolFailed(e.to_string()))?;

        child
            .stdin
            .take()
            .expect("child was spawned with a piped stdin")
            .write_all(source.as_bytes())
            .map_err(|e| EmitError::ExternalToolFailed(e.to_string()))?;

        let output = child
            .wait_with_output()
            .map_err(|e| EmitError::ExternalToolFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(EmitError::ExternalToolFailed(format!(
                "dot exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(output.stdout)
    }
}
