//! C++ streaming parser emitter.
//!
//! Consumes only the [`Analyzer`]; the contract is that constructing the
//! emitted class, calling `processChar` once per input code point, and
//! finally querying `final()` implements the defined automaton. Tables are
//! emitted as static 2-D arrays indexed `[state][class]`, with one extra
//! column for `cc_other`.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::analyzer::{sanitize_identifier, Analyzer, ClassId};
use crate::automaton::Automaton;
use crate::errors::EmitError;

/// Configuration for [`CppEmitter`]'s `generate` entry point: `Ch` override,
/// namespace, and banner message.
#[derive(Debug, Clone)]
pub struct CppEmitOptions {
    /// The character type `processChar` accepts. Defaults to `wchar_t`.
    pub ch_type: String,
    /// An optional namespace the emitted class is wrapped in.
    pub namespace: Option<String>,
    /// An optional top-of-file comment.
    pub message: Option<String>,
}

impl Default for CppEmitOptions {
    fn default() -> Self {
        Self {
            ch_type: "wchar_t".to_string(),
            namespace: None,
            message: None,
        }
    }
}

/// Emits a header and implementation for one analyzed automaton.
pub struct CppEmitter;

impl CppEmitter {
    fn state_ident(name: &str) -> String {
        format!("s_{}", sanitize_identifier(name))
    }

    fn action_ident(name: &str) -> String {
        format!("a_{}", sanitize_identifier(name))
    }

    fn banner(options: &CppEmitOptions, out: &mut impl std::fmt::Write) -> Result<(), EmitError> {
        if let Some(message) = &options.message {
            for line in message.lines() {
                writeln!(out, "// {line}")?;
            }
        }
        Ok(())
    }

    /// Writes the class declaration: enums, public API, and the nested
    /// `Fields` / `Actions` structs.
    pub fn write_header(
        class_name: &str,
        analyzer: &Analyzer,
        options: &CppEmitOptions,
        out: &mut impl std::fmt::Write,
    ) -> Result<(), EmitError> {
        Self::banner(options, out)?;
        writeln!(out, "#pragma once")?;
        writeln!(out)?;

        if let Some(ns) = &options.namespace {
            writeln!(out, "namespace {ns} {{")?;
        }

        writeln!(out, "class {class_name} {{")?;
        writeln!(out, "public:")?;
        writeln!(out, "    {class_name}();")?;
        writeln!(
            out,
            "    bool processChar({ch} ch);",
            ch = options.ch_type
        )?;
        writeln!(out, "    bool final() const;")?;
        writeln!(out)?;
        writeln!(out, "    struct Fields {{}};")?;
        writeln!(out, "    const Fields& fields() const {{ return actions_; }}")?;
        writeln!(out)?;
        writeln!(out, "private:")?;
        writeln!(out, "    enum StateType {{")?;
        for name in analyzer.states() {
            writeln!(out, "        {},", Self::state_ident(name))?;
        }
        writeln!(out, "    }};")?;
        writeln!(out)?;
        writeln!(out, "    enum CharacterClass {{")?;
        for i in 0..analyzer.classes().len() {
            writeln!(out, "        cc_{i},")?;
        }
        writeln!(out, "        cc_other,")?;
        writeln!(out, "    }};")?;
        writeln!(out)?;
        writeln!(out, "    enum ActionType {{")?;
        for (i, name) in analyzer.actions().iter().enumerate() {
            writeln!(out, "        {} = 1 << {},", Self::action_ident(name), i)?;
        }
        writeln!(out, "    }};")?;
        writeln!(out)?;
        writeln!(out, "    struct Actions : Fields {{")?;
        for (name, action_options) in analyzer.actions().iter().zip(analyzer.action_options()) {
            match action_options.char_var.as_deref() {
                Some(char_var) => writeln!(
                    out,
                    "        void do_{}({ch} {var});",
                    sanitize_identifier(name),
                    ch = options.ch_type,
                    var = char_var
                )?,
                None => writeln!(out, "        void do_{}();", sanitize_identifier(name))?,
            }
        }
        writeln!(out, "        void reset_fields();")?;
        writeln!(out, "    }};")?;
        writeln!(out)?;
        writeln!(out, "    static CharacterClass classify({ch} ch);", ch = options.ch_type)?;
        writeln!(out)?;
        writeln!(out, "    StateType state_;")?;
        writeln!(out, "    Actions actions_;")?;
        writeln!(out, "}};")?;

        if options.namespace.is_some() {
            writeln!(out, "}}")?;
        }
        Ok(())
    }

    /// Writes the implementation: the transition/action tables, the
    /// classification switch, the final-state switch, and `processChar`.
    pub fn write_impl(
        class_name: &str,
        automaton: &Automaton,
        analyzer: &Analyzer,
        options: &CppEmitOptions,
        header_name: &str,
        out: &mut impl std::fmt::Write,
    ) -> Result<(), EmitError> {
        Self::banner(options, out)?;
        writeln!(out, "#include \"{header_name}\"")?;
        writeln!(out)?;

        if let Some(ns) = &options.namespace {
            writeln!(out, "namespace {ns} {{")?;
        }

        let n_states = analyzer.states().len();
        let n_cols = analyzer.classes().len() + 1; // + cc_other

        let mut transitions = vec![vec![0usize; n_cols]; n_states];
        let mut actions = vec![vec![0u64; n_cols]; n_states];
        for (state_idx, _) in analyzer.states().iter().enumerate() {
            for class in 0..analyzer.classes().len() {
                let resolved = analyzer.transition_of(automaton, state_idx, ClassId::Class(class));
                transitions[state_idx][class] = resolved.end_state;
                actions[state_idx][class] = resolved.action_mask;
            }
            let resolved = analyzer.transition_of(automaton, state_idx, ClassId::Other);
            transitions[state_idx][n_cols - 1] = resolved.end_state;
            actions[state_idx][n_cols - 1] = resolved.action_mask;
        }

        writeln!(out, "namespace {{")?;
        writeln!(
            out,
            "const {class}::StateType parserTransitions[{n_states}][{n_cols}] = {{",
            class = class_name
        )?;
        for row in &transitions {
            let cells: Vec<String> = row
                .iter()
                .map(|&s| Self::state_ident(&analyzer.states()[s]))
                .collect();
            writeln!(out, "    {{ {} }},", cells.join(", "))?;
        }
        writeln!(out, "}};")?;
        writeln!(out)?;
        writeln!(out, "const unsigned long parserActions[{n_states}][{n_cols}] = {{")?;
        for row in &actions {
            let cells: Vec<String> = row.iter().map(|m| m.to_string()).collect();
            writeln!(out, "    {{ {} }},", cells.join(", "))?;
        }
        writeln!(out, "}};")?;
        writeln!(out, "}} // namespace")?;
        writeln!(out)?;

        writeln!(
            out,
            "{class}::CharacterClass {class}::classify({ch} ch) {{",
            class = class_name,
            ch = options.ch_type
        )?;
        writeln!(out, "    switch (ch) {{")?;
        for (i, class) in analyzer.classes().iter().enumerate() {
            for cp in class.iter() {
                writeln!(out, "        case {cp}: return cc_{i};")?;
            }
        }
        writeln!(out, "        default: return cc_other;")?;
        writeln!(out, "    }}")?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "{class}::{class}() : state_({start}) {{}}", class = class_name, start = Self::state_ident(
            automaton.start_state().unwrap_or("error")
        ))?;
        writeln!(out)?;

        writeln!(out, "bool {class}::final() const {{", class = class_name)?;
        writeln!(out, "    switch (state_) {{")?;
        for (idx, name) in analyzer.states().iter().enumerate() {
            if analyzer.is_final(idx) {
                writeln!(out, "        case {}: return true;", Self::state_ident(name))?;
            }
        }
        writeln!(out, "        default: return false;")?;
        writeln!(out, "    }}")?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(
            out,
            "bool {class}::processChar({ch} ch) {{",
            class = class_name,
            ch = options.ch_type
        )?;
        writeln!(out, "    actions_.reset_fields();")?;
        writeln!(out, "    CharacterClass cls = classify(ch);")?;
        writeln!(out, "    StateType next = parserTransitions[state_][cls];")?;
        writeln!(out, "    unsigned long mask = parserActions[state_][cls];")?;
        for (name, action_options) in analyzer.actions().iter().zip(analyzer.action_options()) {
            let call = if action_options.char_var.is_some() {
                format!("do_{}(ch)", sanitize_identifier(name))
            } else {
                format!("do_{}()", sanitize_identifier(name))
            };
            writeln!(
                out,
                "    if (mask & {}) actions_.{};",
                Self::action_ident(name),
                call
            )?;
        }
        writeln!(out, "    state_ = next;")?;
        writeln!(
            out,
            "    return state_ != {};",
            Self::state_ident(
                analyzer
                    .states()
                    .get(analyzer.error_state())
                    .expect("error state index is always valid")
            )
        )?;
        writeln!(out, "}}")?;

        if options.namespace.is_some() {
            writeln!(out, "}}")?;
        }
        Ok(())
    }

    /// Writes `<base>.h` and `<base>.cpp` (the latter `#include`-ing the
    /// former).
    ///
    /// # Errors
    ///
    /// Fails [`EmitError::Io`] if either file cannot be written.
    pub fn generate_to_files(
        class_name: &str,
        automaton: &Automaton,
        analyzer: &Analyzer,
        options: &CppEmitOptions,
        base_path: &Path,
    ) -> Result<(), EmitError> {
        let header_path = base_path.with_extension("h");
        let impl_path = base_path.with_extension("cpp");
        let header_name = header_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{class_name}.h"));

        let mut header = String::new();
        Self::write_header(class_name, analyzer, options, &mut header)?;
        let mut implementation = String::new();
        Self::write_impl(class_name, automaton, analyzer, options, &header_name, &mut implementation)?;

        fs::write(&header_path, header)?;
        fs::write(&impl_path, implementation)?;
        Ok(())
    }
}
