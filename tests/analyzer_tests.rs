use fsmgen::analyzer::ClassId;
use fsmgen::automaton::{ActionOptions, Automaton, TransitionKey};
use fsmgen::errors::AnalysisError;

fn build(f: impl FnOnce(&mut Automaton)) -> Automaton {
    let mut automaton = Automaton::new();
    f(&mut automaton);
    automaton
}

#[test]
fn state_default_beats_machine_default_beats_error() {
    // Exercises state-default beating machine-default, and machine-default
    // beating the implicit error state.
    let mut automaton = build(|a| {
        let with_default = a.declare_state("with_default", false).unwrap();
        let without_default = a.declare_state("without_default", false).unwrap();
        a.declare_state("fallback", false).unwrap();
        a.add_transition(with_default, TransitionKey::Default, "with_default", vec![])
            .unwrap();
        let _ = without_default;
    });
    automaton.set_machine_default("fallback", vec![]).unwrap();

    let analyzer = automaton.analyze().unwrap();

    let with_default_idx = analyzer.states().iter().position(|s| s == "with_default").unwrap();
    let resolved = analyzer.transition_of(&automaton, with_default_idx, ClassId::Other);
    assert_eq!(analyzer.states()[resolved.end_state], "with_default");

    let without_default_idx = analyzer
        .states()
        .iter()
        .position(|s| s == "without_default")
        .unwrap();
    let resolved = analyzer.transition_of(&automaton, without_default_idx, ClassId::Other);
    assert_eq!(analyzer.states()[resolved.end_state], "fallback");
}

#[test]
fn no_default_at_all_resolves_to_error_with_empty_mask() {
    let mut automaton = Automaton::new();
    automaton.declare_action("fire", ActionOptions::none(), None).unwrap();
    let s = automaton.declare_state("s", false).unwrap();
    automaton
        .add_transition(s, TransitionKey::chars("a"), "s", vec!["fire".to_string()])
        .unwrap();

    let analyzer = automaton.analyze().unwrap();
    let s_idx = analyzer.states().iter().position(|n| n == "s").unwrap();
    let resolved = analyzer.transition_of(&automaton, s_idx, ClassId::Other);
    assert_eq!(analyzer.states()[resolved.end_state], "error");
    assert_eq!(resolved.action_mask, 0);
}

#[test]
fn unknown_state_reference_fails_analysis() {
    let mut automaton = Automaton::new();
    let s = automaton.declare_state("s", false).unwrap();
    automaton
        .add_transition(s, TransitionKey::chars("a"), "ghost", vec![])
        .unwrap();
    automaton.freeze();

    let err = fsmgen::Analyzer::build(&automaton).unwrap_err();
    assert_eq!(err, AnalysisError::UnknownState("ghost".to_string()));
}

#[test]
fn error_is_only_auto_inserted_when_the_user_never_declares_it() {
    let mut automaton = Automaton::new();
    automaton.declare_state("start", false).unwrap();
    automaton.freeze();
    let analyzer = fsmgen::Analyzer::build(&automaton).unwrap();
    assert_eq!(analyzer.states(), &["start", "error"]);

    let mut automaton = Automaton::new();
    automaton.declare_state("start", false).unwrap();
    automaton.declare_state("error", false).unwrap();
    automaton.freeze();
    let analyzer = fsmgen::Analyzer::build(&automaton).unwrap();
    assert_eq!(analyzer.states(), &["start", "error"]);
}
