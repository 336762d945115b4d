//! The read-only view over a frozen [`Automaton`] that emitters consume:
//! ordered state/action lists, the character-class partition, and transition
//! resolution.
//!
//! A mutable builder produces an immutable value, and this separate,
//! smaller struct summarizes it read-only for downstream consumers — here,
//! the resolved transition table, rather than a reachability report.

use indexmap::IndexMap;

use crate::automaton::{ActionOptions, Automaton, ERROR_STATE};
use crate::charset::CharSet;
use crate::errors::AnalysisError;
use crate::partition::Partitioner;

/// The class a code point belongs to, or the catch-all sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassId {
    /// A member of the computed partition, by index.
    Class(usize),
    /// Any code point outside every computed class.
    Other,
}

/// A resolved transition: where it goes and which actions fire, as a
/// bitmask over action `order_key`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    /// Index into [`Analyzer::states`] of the destination state.
    pub end_state: usize,
    /// Bit `i` is set iff the action with `order_key == i` fires.
    pub action_mask: u64,
}

/// Replaces any byte outside `[A-Za-z0-9_]` with `_`.
#[must_use]
pub fn sanitize_identifier(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// The frozen, analyzed view of an [`Automaton`], ready for emitters.
#[derive(Debug, Clone)]
pub struct Analyzer {
    state_names: Vec<String>,
    state_index: IndexMap<String, usize>,
    final_states: Vec<bool>,
    action_names: Vec<String>,
    action_options: Vec<ActionOptions>,
    classes: Vec<CharSet>,
    error_state: usize,
}

impl Analyzer {
    /// Builds an [`Analyzer`] over `automaton`, which must already be frozen
    /// (see [`Automaton::freeze`] / the `analyze` entry point that calls it).
    ///
    /// # Errors
    ///
    /// Fails [`AnalysisError::UnknownState`] if any transition names a state
    /// that was never declared (other than the implicit `error` sink), or
    /// [`AnalysisError::NameCollision`] if two distinct declared names
    /// sanitize to the same identifier.
    pub fn build(automaton: &Automaton) -> Result<Self, AnalysisError> {
        let mut state_names: Vec<String> =
            automaton.states().map(|s| s.name().to_string()).collect();
        let mut final_states: Vec<bool> = automaton.states().map(|s| s.is_final()).collect();

        let error_state = if automaton.has_declared_state(ERROR_STATE) {
            state_names
                .iter()
                .position(|n| n == ERROR_STATE)
                .expect("declared error state must appear in state_names")
        } else {
            state_names.push(ERROR_STATE.to_string());
            final_states.push(false);
            state_names.len() - 1
        };

        let mut state_index = IndexMap::new();
        for (idx, name) in state_names.iter().enumerate() {
            state_index.insert(name.clone(), idx);
        }

        let action_names: Vec<String> = automaton.actions().map(|a| a.name().to_string()).collect();
        let action_options: Vec<ActionOptions> =
            automaton.actions().map(|a| a.options().clone()).collect();

        check_known_state(automaton, &state_index)?;
        check_no_collisions_within(&state_names)?;
        check_no_collisions_within(&action_names)?;

        let mut partitioner = Partitioner::new();
        for state in automaton.states() {
            for (key, _) in state.explicit_transitions() {
                partitioner.feed(key);
            }
        }
        let classes = partitioner.classes().to_vec();

        Ok(Self {
            state_names,
            state_index,
            final_states,
            action_names,
            action_options,
            classes,
            error_state,
        })
    }

    /// The states, in the order emitters should enumerate them: declaration
    /// order, with the implicit `error` state appended if the user never
    /// declared it.
    #[must_use]
    pub fn states(&self) -> &[String] {
        &self.state_names
    }

    /// The actions, in `order_key` order.
    #[must_use]
    pub fn actions(&self) -> &[String] {
        &self.action_names
    }

    /// Per-action code point options, parallel to [`Analyzer::actions`].
    #[must_use]
    pub fn action_options(&self) -> &[ActionOptions] {
        &self.action_options
    }

    /// Whether the state at `index` (as returned by [`Analyzer::states`])
    /// is final.
    #[must_use]
    pub fn is_final(&self, index: usize) -> bool {
        self.final_states[index]
    }

    /// The computed character-class partition, in stable numbering order.
    #[must_use]
    pub fn classes(&self) -> &[CharSet] {
        &self.classes
    }

    /// The index of the implicit or user-declared `error` state.
    #[must_use]
    pub fn error_state(&self) -> usize {
        self.error_state
    }

    fn state_idx(&self, name: &str) -> usize {
        *self
            .state_index
            .get(name)
            .expect("all referenced states were validated during build")
    }

    fn action_bit(&self, name: &str) -> u64 {
        let order_key = self
            .action_names
            .iter()
            .position(|n| n == name)
            .expect("all referenced actions were validated at definition time");
        1u64 << order_key
    }

    /// Resolves the transition taken from `state` (an index into
    /// [`Analyzer::states`]) on a code point belonging to `class`.
    ///
    /// Resolution proceeds in four steps: explicit match by representative
    /// code point, then state-local default, then machine-wide default,
    /// then `error` with an empty action mask.
    #[must_use]
    pub fn transition_of(&self, automaton: &Automaton, state: usize, class: ClassId) -> Resolved {
        let representative = match class {
            ClassId::Class(i) => self.classes[i].iter().next(),
            ClassId::Other => None,
        };

        let state_name = &self.state_names[state];
        let Some(state_def) = automaton.state(state_name) else {
            return Resolved {
                end_state: self.error_state,
                action_mask: 0,
            };
        };

        if let Some(r) = representative {
            for (key, transition) in state_def.explicit_transitions() {
                if key.contains(r) {
                    return self.resolved_from(transition.end_state(), transition.actions());
                }
            }
        }

        if let Some(transition) = state_def.default_transition() {
            return self.resolved_from(transition.end_state(), transition.actions());
        }

        if let Some(transition) = automaton.machine_default() {
            return self.resolved_from(transition.end_state(), transition.actions());
        }

        Resolved {
            end_state: self.error_state,
            action_mask: 0,
        }
    }

    fn resolved_from(&self, end_state: &str, actions: &[String]) -> Resolved {
        let mut action_mask = 0u64;
        for name in actions {
            action_mask |= self.action_bit(name);
        }
        Resolved {
            end_state: self.state_idx(end_state),
            action_mask,
        }
    }
}

fn check_known_state(
    automaton: &Automaton,
    state_index: &IndexMap<String, usize>,
) -> Result<(), AnalysisError> {
    for state in automaton.states() {
        for (_, transition) in state.explicit_transitions() {
            if !state_index.contains_key(transition.end_state()) {
                return Err(AnalysisError::UnknownState(
                    transition.end_state().to_string(),
                ));
            }
        }
        if let Some(t) = state.default_transition() {
            if !state_index.contains_key(t.end_state()) {
                return Err(AnalysisError::UnknownState(t.end_state().to_string()));
            }
        }
    }
    if let Some(t) = automaton.machine_default() {
        if !state_index.contains_key(t.end_state()) {
            return Err(AnalysisError::UnknownState(t.end_state().to_string()));
        }
    }
    Ok(())
}

/// Checks one emitted-identifier namespace (states or actions) for two
/// distinct declared names that sanitize to the same identifier. States and
/// actions are emitted into separate, prefixed C++ enums, so they are
/// checked independently rather than against a merged set.
fn check_no_collisions_within(names: &[String]) -> Result<(), AnalysisError> {
    let mut seen: IndexMap<String, String> = IndexMap::new();
    for name in names {
        let sanitized = sanitize_identifier(name);
        if let Some(existing) = seen.get(&sanitized) {
            if existing != name {
                return Err(AnalysisError::NameCollision(sanitized));
            }
        } else {
            seen.insert(sanitized, name.clone());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::{ActionOptions, TransitionKey};

    fn build_signed_integer() -> Automaton {
        let mut automaton = Automaton::new();
        automaton
            .declare_action("set_sign", ActionOptions::with_char_var("ch"), None)
            .unwrap();
        automaton
            .declare_action("accumulate", ActionOptions::with_char_var("ch"), None)
            .unwrap();
        let start = automaton.declare_state("start", false).unwrap();
        let digits = automaton.declare_state("digits", true).unwrap();
        automaton
            .add_transition(start, TransitionKey::chars("+-"), "start", vec!["set_sign".into()])
            .unwrap();
        automaton
            .add_transition(start, TransitionKey::chars("0-9"), "digits", vec!["accumulate".into()])
            .unwrap();
        automaton
            .add_transition(digits, TransitionKey::chars("0-9"), "digits", vec!["accumulate".into()])
            .unwrap();
        automaton.freeze();
        automaton
    }

    #[test]
    fn error_state_is_appended_when_not_declared() {
        let automaton = build_signed_integer();
        let analyzer = Analyzer::build(&automaton).unwrap();
        assert_eq!(analyzer.states(), &["start", "digits", "error"]);
        assert_eq!(analyzer.error_state(), 2);
        assert!(!analyzer.is_final(2));
    }

    #[test]
    fn user_declared_error_state_is_authoritative() {
        let mut automaton = Automaton::new();
        automaton.declare_state("start", false).unwrap();
        automaton.declare_state("error", false).unwrap();
        automaton.freeze();
        let analyzer = Analyzer::build(&automaton).unwrap();
        assert_eq!(analyzer.states(), &["start", "error"]);
        assert_eq!(analyzer.error_state(), 1);
    }

    #[test]
    fn transition_of_resolves_explicit_then_default_then_error() {
        let automaton = build_signed_integer();
        let analyzer = Analyzer::build(&automaton).unwrap();
        let start = analyzer.state_idx("start");

        let plus_class = analyzer
            .classes()
            .iter()
            .position(|c| c.contains('+' as u32))
            .unwrap();
        let resolved = analyzer.transition_of(&automaton, start, ClassId::Class(plus_class));
        assert_eq!(analyzer.states()[resolved.end_state], "start");
        assert_eq!(resolved.action_mask, 1 << 0);

        let resolved_other = analyzer.transition_of(&automaton, start, ClassId::Other);
        assert_eq!(analyzer.states()[resolved_other.end_state], "error");
        assert_eq!(resolved_other.action_mask, 0);
    }

    #[test]
    fn state_default_beats_machine_default() {
        let mut automaton = Automaton::new();
        let s = automaton.declare_state("s", false).unwrap();
        let t = automaton.declare_state("t", false).unwrap();
        let u = automaton.declare_state("u", false).unwrap();
        automaton
            .add_transition(s, TransitionKey::Default, "t", vec![])
            .unwrap();
        automaton.set_machine_default("u", vec![]).unwrap();
        automaton.freeze();
        let analyzer = Analyzer::build(&automaton).unwrap();
        let s_idx = analyzer.state_idx("s");
        let resolved = analyzer.transition_of(&automaton, s_idx, ClassId::Other);
        assert_eq!(analyzer.states()[resolved.end_state], "t");
        let _ = (t, u);
    }

    #[test]
    fn unknown_state_reference_is_rejected() {
        let mut automaton = Automaton::new();
        let s = automaton.declare_state("s", false).unwrap();
        automaton
            .add_transition(s, TransitionKey::chars("a"), "nowhere", vec![])
            .unwrap();
        automaton.freeze();
        let err = Analyzer::build(&automaton).unwrap_err();
        assert_eq!(err, AnalysisError::UnknownState("nowhere".to_string()));
    }

    #[test]
    fn name_collision_is_rejected() {
        let mut automaton = Automaton::new();
        automaton.declare_state("a-b", false).unwrap();
        automaton.declare_state("a_b", false).unwrap();
        automaton.freeze();
        let err = Analyzer::build(&automaton).unwrap_err();
        assert_eq!(err, AnalysisError::NameCollision("a_b".to_string()));
    }

    #[test]
    fn same_sanitized_identifier_across_states_and_actions_is_not_a_collision() {
        let mut automaton = Automaton::new();
        automaton
            .declare_action("a.b", ActionOptions::none(), None)
            .unwrap();
        let s = automaton.declare_state("a-b", false).unwrap();
        let t = automaton.declare_state("t", false).unwrap();
        automaton
            .add_transition(s, TransitionKey::chars("x"), "t", vec!["a.b".into()])
            .unwrap();
        automaton.freeze();
        let analyzer = Analyzer::build(&automaton).unwrap();
        assert_eq!(analyzer.states()[0], "a-b");
        assert_eq!(analyzer.actions()[0], "a.b");
        let _ = t;
    }

    #[test]
    fn action_options_are_exposed_parallel_to_action_names() {
        let automaton = build_signed_integer();
        let analyzer = Analyzer::build(&automaton).unwrap();
        assert_eq!(analyzer.actions(), &["set_sign", "accumulate"]);
        assert_eq!(
            analyzer.action_options()[0].char_var.as_deref(),
            Some("ch")
        );
        assert_eq!(
            analyzer.action_options()[1].char_var.as_deref(),
            Some("ch")
        );
    }

    fn classify_or_other(analyzer: &Analyzer, ch: char) -> ClassId {
        analyzer
            .classes()
            .iter()
            .position(|c| c.contains(ch as u32))
            .map_or(ClassId::Other, ClassId::Class)
    }

    fn run(automaton: &Automaton, analyzer: &Analyzer, input: &str) -> (Vec<bool>, bool) {
        let mut state = analyzer.state_idx(automaton.start_state().unwrap());
        let mut accepted = Vec::with_capacity(input.len());
        for ch in input.chars() {
            let class = classify_or_other(analyzer, ch);
            let resolved = analyzer.transition_of(automaton, state, class);
            accepted.push(resolved.end_state != analyzer.error_state());
            state = resolved.end_state;
        }
        (accepted, analyzer.is_final(state))
    }

    #[test]
    fn signed_integer_accepts_a_leading_sign_followed_by_digits() {
        let automaton = build_signed_integer();
        let analyzer = Analyzer::build(&automaton).unwrap();
        let (accepted, is_final) = run(&automaton, &analyzer, "+42");
        assert_eq!(accepted, vec![true, true, true]);
        assert!(is_final);
    }

    #[test]
    fn signed_integer_rejects_a_sign_that_is_not_leading() {
        let automaton = build_signed_integer();
        let analyzer = Analyzer::build(&automaton).unwrap();
        let (accepted, is_final) = run(&automaton, &analyzer, "4+");
        assert_eq!(accepted, vec![true, false]);
        assert!(!is_final);
    }
}
