//! Builds the signed-integer recognizer, analyzes it, and writes both the
//! C++ parser and the Graphviz state diagram.
//!
//! Usage: `fsmgen-demo [--out <base>]`. With no `--out`, both outputs are
//! written to stdout, header-and-impl first, dot source second.

use std::env;
use std::io::Write as _;

use fsmgen::automaton::{ActionOptions, Automaton, TransitionKey};
use fsmgen::emit::{CppEmitOptions, CppEmitter, DotEmitOptions, DotEmitter};

fn build_signed_integer_recognizer() -> Automaton {
    let mut automaton = Automaton::new();
    automaton
        .declare_action("set_sign", ActionOptions::with_char_var("ch"), None)
        .expect("set_sign is the first action declared");
    automaton
        .declare_action("accumulate", ActionOptions::with_char_var("ch"), None)
        .expect("accumulate is the second action declared");

    let start = automaton
        .declare_state("start", false)
        .expect("start is the first state declared");
    let digits = automaton
        .declare_state("digits", true)
        .expect("digits has not been declared yet");

    automaton
        .add_transition(start, TransitionKey::chars("+-"), "start", vec!["set_sign".to_string()])
        .expect("start has no other transition on +-");
    automaton
        .add_transition(
            start,
            TransitionKey::chars("0-9"),
            "digits",
            vec!["accumulate".to_string()],
        )
        .expect("start has no other transition on 0-9");
    automaton
        .add_transition(
            digits,
            TransitionKey::chars("0-9"),
            "digits",
            vec!["accumulate".to_string()],
        )
        .expect("digits has no other transition on 0-9");

    automaton
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let out_base = match args.as_slice() {
        [] => None,
        [flag, base] if flag == "--out" => Some(base.clone()),
        _ => {
            eprintln!("usage: fsmgen-demo [--out <base>]");
            std::process::exit(1);
        }
    };

    tracing::info!("building signed-integer recognizer");
    let mut automaton = build_signed_integer_recognizer();

    tracing::info!("analyzing automaton");
    let analyzer = automaton
        .analyze()
        .expect("the signed-integer recognizer is internally consistent");
    tracing::info!(
        states = analyzer.states().len(),
        classes = analyzer.classes().len(),
        "analysis complete"
    );

    let cpp_options = CppEmitOptions::default();
    let dot_options = DotEmitOptions::default();

    match out_base {
        Some(base) => {
            let base_path = std::path::Path::new(&base);
            CppEmitter::generate_to_files("SignedInt", &automaton, &analyzer, &cpp_options, base_path)
                .expect("writing the C++ header/impl should not fail");
            tracing::info!(base = %base, "wrote C++ header and implementation");

            let mut dot_source = String::new();
            DotEmitter::write(&automaton, &dot_options, &mut dot_source)
                .expect("writing dot source to an in-memory string cannot fail");
            let dot_path = base_path.with_extension("dot");
            std::fs::write(&dot_path, dot_source).expect("writing the dot file should not fail");
            tracing::info!(path = %dot_path.display(), "wrote dot source");
        }
        None => {
            let mut header = String::new();
            CppEmitter::write_header("SignedInt", &analyzer, &cpp_options, &mut header)
                .expect("writing to an in-memory string cannot fail");
            let mut implementation = String::new();
            CppEmitter::write_impl(
                "SignedInt",
                &automaton,
                &analyzer,
                &cpp_options,
                "signed_int.h",
                &mut implementation,
            )
            .expect("writing to an in-memory string cannot fail");
            let mut dot_source = String::new();
            DotEmitter::write(&automaton, &dot_options, &mut dot_source)
                .expect("writing to an in-memory string cannot fail");

            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{header}").unwrap();
            writeln!(handle, "{implementation}").unwrap();
            writeln!(handle, "{dot_source}").unwrap();
        }
    }
}
