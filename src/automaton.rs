//! The automaton data model: actions, states, transitions, and the builder
//! that assembles them under their ordering and exclusivity invariants.
//!
//! A builder type accumulates state through `Result`-returning methods,
//! paired with the frozen value type the rest of the crate analyzes —
//! generalized from a fixed alphabet-indexed transition matrix to named,
//! possibly-overlapping character-set keys.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::charset::CharSet;
use crate::errors::BuildError;

/// Identifies a declared state without borrowing the [`Automaton`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateHandle(u32);

/// The reserved name for the implicit terminal sink state.
pub const ERROR_STATE: &str = "error";

/// The single recognized action option: which identifier, if any, receives
/// the current code point when the action fires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOptions {
    /// Identifier bound to the current code point inside the action body,
    /// if the action wants to see it.
    pub char_var: Option<String>,
}

impl ActionOptions {
    /// No options set.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Requests the current code point under the given identifier.
    #[must_use]
    pub fn with_char_var(name: impl Into<String>) -> Self {
        Self {
            char_var: Some(name.into()),
        }
    }
}

/// Small record handed to a [`CodeFragment::Generator`] callback instead of
/// letting it close over generator internals by implicit binding.
#[derive(Debug, Clone)]
pub struct GeneratorContext {
    /// The emitted character type (e.g. `wchar_t`).
    pub ch_type: String,
    /// The name of the class/struct being generated.
    pub class_name: String,
}

/// Source text attached to an action, either precomputed or produced by an
/// explicit function of a [`GeneratorContext`].
#[derive(Clone)]
pub enum CodeFragment {
    /// Literal source text, emitted verbatim.
    Source(String),
    /// A function computing source text from the generator context.
    Generator(Rc<dyn Fn(&GeneratorContext) -> String>),
}

impl CodeFragment {
    /// Resolves this fragment to source text for the given context.
    #[must_use]
    pub fn render(&self, ctx: &GeneratorContext) -> String {
        match self {
            CodeFragment::Source(text) => text.clone(),
            CodeFragment::Generator(f) => f(ctx),
        }
    }
}

impl fmt::Debug for CodeFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeFragment::Source(text) => f.debug_tuple("Source").field(text).finish(),
            CodeFragment::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

/// A named, ordered, side-effecting operation emitted into the generated
/// parser.
#[derive(Debug, Clone)]
pub struct Action {
    name: String,
    order_key: u32,
    options: ActionOptions,
    code_fragment: Option<CodeFragment>,
}

impl Action {
    /// The action's declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The monotonically assigned registration index.
    #[must_use]
    pub fn order_key(&self) -> u32 {
        self.order_key
    }

    /// The recognized options for this action.
    #[must_use]
    pub fn options(&self) -> &ActionOptions {
        &self.options
    }

    /// The attached code fragment, if any.
    #[must_use]
    pub fn code_fragment(&self) -> Option<&CodeFragment> {
        self.code_fragment.as_ref()
    }

    /// The bit this action occupies in a transition's action bitmask.
    #[must_use]
    pub fn bit(&self) -> u64 {
        1u64 << self.order_key
    }
}

/// A transition taken when its key matches: destination state plus an
/// ordered, `order_key`-increasing list of action names.
#[derive(Debug, Clone)]
pub struct Transition {
    end_state: String,
    actions: Vec<String>,
}

impl Transition {
    /// The destination state name (may be a forward reference until
    /// analysis).
    #[must_use]
    pub fn end_state(&self) -> &str {
        &self.end_state
    }

    /// The ordered action names fired by this transition.
    #[must_use]
    pub fn actions(&self) -> &[String] {
        &self.actions
    }
}

/// A key under which a transition is registered on a state.
#[derive(Debug, Clone)]
pub enum TransitionKey {
    /// Fires only when the current code point is a member of this set.
    Explicit(CharSet),
    /// Fires on any code point not covered by an explicit key on this state.
    Default,
}

impl TransitionKey {
    /// Expands a builder-level string key (e.g. `"0-9"`, `"+-"`) into an
    /// explicit key.
    #[must_use]
    pub fn chars(key: &str) -> Self {
        TransitionKey::Explicit(CharSet::from_key_str(key))
    }

    /// An explicit key spanning an inclusive integer range.
    #[must_use]
    pub fn range(lo: u32, hi: u32) -> Self {
        TransitionKey::Explicit(CharSet::from_range(lo, hi))
    }

    /// An explicit key from an already-built character set.
    #[must_use]
    pub fn set(charset: CharSet) -> Self {
        TransitionKey::Explicit(charset)
    }
}

/// A declared automaton state: its finality, its explicit transitions
/// (pairwise disjoint keys), and at most one default transition.
#[derive(Debug, Clone)]
pub struct State {
    name: String,
    is_final: bool,
    explicit: IndexMap<CharSet, Transition>,
    default: Option<Transition>,
}

impl State {
    /// The state's declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether input may legally end while in this state.
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// The explicit transitions, in registration order.
    pub fn explicit_transitions(&self) -> impl Iterator<Item = (&CharSet, &Transition)> {
        self.explicit.iter()
    }

    /// The state-level default transition, if any.
    #[must_use]
    pub fn default_transition(&self) -> Option<&Transition> {
        self.default.as_ref()
    }
}

/// The complete, mutable-until-frozen definition of a finite automaton.
#[derive(Debug, Clone)]
pub struct Automaton {
    actions: IndexMap<String, Action>,
    states: IndexMap<String, State>,
    start_state: Option<String>,
    machine_default: Option<Transition>,
    frozen: bool,
}

impl Default for Automaton {
    fn default() -> Self {
        Self::new()
    }
}

impl Automaton {
    /// Creates an empty, mutable automaton.
    #[must_use]
    pub fn new() -> Self {
        Self {
            actions: IndexMap::new(),
            states: IndexMap::new(),
            start_state: None,
            machine_default: None,
            frozen: false,
        }
    }

    /// Whether the automaton has been frozen by a call to `analyze`.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn require_mutable(&self) -> Result<(), BuildError> {
        if self.frozen {
            Err(BuildError::Frozen)
        } else {
            Ok(())
        }
    }

    /// Declares a new action. Assigns the next monotonic `order_key`.
    ///
    /// # Errors
    ///
    /// Fails [`BuildError::DuplicateAction`] if `name` was already declared,
    /// [`BuildError::LateAction`] if any state has already been declared, or
    /// [`BuildError::Frozen`] if analysis has already started.
    pub fn declare_action(
        &mut self,
        name: impl Into<String>,
        options: ActionOptions,
        code_fragment: Option<CodeFragment>,
    ) -> Result<(), BuildError> {
        self.require_mutable()?;
        let name = name.into();
        if !self.states.is_empty() {
            return Err(BuildError::LateAction(name));
        }
        if self.actions.contains_key(&name) {
            return Err(BuildError::DuplicateAction(name));
        }
        let order_key = self.actions.len() as u32;
        self.actions.insert(
            name.clone(),
            Action {
                name,
                order_key,
                options,
                code_fragment,
            },
        );
        Ok(())
    }

    /// Declares a new state. The first state declared becomes the
    /// automaton's start state.
    ///
    /// # Errors
    ///
    /// Fails [`BuildError::DuplicateState`] if `name` was already declared,
    /// or [`BuildError::Frozen`] if analysis has already started.
    pub fn declare_state(
        &mut self,
        name: impl Into<String>,
        is_final: bool,
    ) -> Result<StateHandle, BuildError> {
        self.require_mutable()?;
        let name = name.into();
        if self.states.contains_key(&name) {
            return Err(BuildError::DuplicateState(name));
        }
        let index = self.states.len() as u32;
        if self.start_state.is_none() {
            self.start_state = Some(name.clone());
        }
        self.states.insert(
            name.clone(),
            State {
                name,
                is_final,
                explicit: IndexMap::new(),
                default: None,
            },
        );
        Ok(StateHandle(index))
    }

    fn state_mut_by_handle(&mut self, handle: StateHandle) -> &mut State {
        self.states
            .get_index_mut(handle.0 as usize)
            .expect("StateHandle must refer to a state in this Automaton")
            .1
    }

    fn validate_action_sequence(&self, actions: &[String]) -> Result<(), BuildError> {
        let mut last_order: Option<u32> = None;
        for name in actions {
            let action = self
                .actions
                .get(name)
                .ok_or_else(|| BuildError::UndefinedAction(name.clone()))?;
            if let Some(last) = last_order {
                if action.order_key() <= last {
                    return Err(BuildError::ActionOutOfOrder(name.clone()));
                }
            }
            last_order = Some(action.order_key());
        }
        Ok(())
    }

    /// Registers a transition on the given state.
    ///
    /// # Errors
    ///
    /// Fails [`BuildError::ActionOutOfOrder`] if `actions` is not strictly
    /// increasing by `order_key`, [`BuildError::UndefinedAction`] if an
    /// action name is unknown, [`BuildError::OverlappingTransition`] if an
    /// explicit key overlaps one already registered on this state,
    /// [`BuildError::DuplicateDefault`] if a default was already set on this
    /// state, or [`BuildError::Frozen`] if analysis has already started.
    pub fn add_transition(
        &mut self,
        state: StateHandle,
        key: TransitionKey,
        end_state: impl Into<String>,
        actions: Vec<String>,
    ) -> Result<(), BuildError> {
        self.require_mutable()?;
        self.validate_action_sequence(&actions)?;
        let end_state = end_state.into();
        let transition = Transition {
            end_state,
            actions,
        };
        let state_name = self.states.get_index(state.0 as usize).map(|(n, _)| n.clone())
            .expect("StateHandle must refer to a state in this Automaton");
        match key {
            TransitionKey::Default => {
                let st = self.state_mut_by_handle(state);
                if st.default.is_some() {
                    return Err(BuildError::DuplicateDefault(state_name));
                }
                st.default = Some(transition);
                Ok(())
            }
            TransitionKey::Explicit(charset) => {
                let st = self.state_mut_by_handle(state);
                for existing in st.explicit.keys() {
                    let overlap = existing.intersection(&charset);
                    if !overlap.is_empty() {
                        return Err(BuildError::OverlappingTransition {
                            state: state_name,
                            overlap,
                        });
                    }
                }
                st.explicit.insert(charset, transition);
                Ok(())
            }
        }
    }

    /// Registers the machine-wide default transition, fired when a state
    /// has no explicit nor state-default match.
    ///
    /// # Errors
    ///
    /// Fails [`BuildError::DuplicateMachineDefault`] if already set, or the
    /// same action-ordering/frozen errors as [`Automaton::add_transition`].
    pub fn set_machine_default(
        &mut self,
        end_state: impl Into<String>,
        actions: Vec<String>,
    ) -> Result<(), BuildError> {
        self.require_mutable()?;
        self.validate_action_sequence(&actions)?;
        if self.machine_default.is_some() {
            return Err(BuildError::DuplicateMachineDefault);
        }
        self.machine_default = Some(Transition {
            end_state: end_state.into(),
            actions,
        });
        Ok(())
    }

    /// The actions, in `order_key` order.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.values()
    }

    /// The states, in declaration order.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.values()
    }

    /// Looks up a declared state by name.
    #[must_use]
    pub fn state(&self, name: &str) -> Option<&State> {
        self.states.get(name)
    }

    /// Looks up a declared action by name.
    #[must_use]
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    /// The start state's name, if any state has been declared.
    #[must_use]
    pub fn start_state(&self) -> Option<&str> {
        self.start_state.as_deref()
    }

    /// The machine-wide default transition, if set.
    #[must_use]
    pub fn machine_default(&self) -> Option<&Transition> {
        self.machine_default.as_ref()
    }

    /// Whether a state by this name was explicitly declared.
    #[must_use]
    pub fn has_declared_state(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    /// Freezes the automaton so no further mutation is possible. Idempotent.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Freezes the automaton and builds an [`crate::analyzer::Analyzer`]
    /// over it in one step. This is the usual entry point into analysis;
    /// [`Automaton::freeze`] plus [`crate::analyzer::Analyzer::build`] is
    /// available separately for callers that want to freeze without
    /// analyzing yet.
    ///
    /// # Errors
    ///
    /// See [`crate::analyzer::Analyzer::build`].
    pub fn analyze(&mut self) -> Result<crate::analyzer::Analyzer, crate::errors::AnalysisError> {
        self.freeze();
        crate::analyzer::Analyzer::build(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_and_digits() -> Result<Automaton, BuildError> {
        let mut automaton = Automaton::new();
        automaton.declare_action("set_sign", ActionOptions::with_char_var("ch"), None)?;
        automaton.declare_action("accumulate", ActionOptions::with_char_var("ch"), None)?;

        let start = automaton.declare_state("start", false)?;
        let digits = automaton.declare_state("digits", true)?;

        automaton.add_transition(
            start,
            TransitionKey::chars("+-"),
            "start",
            vec!["set_sign".to_string()],
        )?;
        automaton.add_transition(
            start,
            TransitionKey::chars("0-9"),
            "digits",
            vec!["accumulate".to_string()],
        )?;
        automaton.add_transition(
            digits,
            TransitionKey::chars("0-9"),
            "digits",
            vec!["accumulate".to_string()],
        )?;
        Ok(automaton)
    }

    #[test]
    fn builds_signed_integer_recognizer() {
        let automaton = sign_and_digits().unwrap();
        assert_eq!(automaton.start_state(), Some("start"));
        assert_eq!(automaton.actions().count(), 2);
        assert_eq!(automaton.states().count(), 2);
    }

    #[test]
    fn duplicate_action_is_rejected() {
        let mut automaton = Automaton::new();
        automaton
            .declare_action("a", ActionOptions::none(), None)
            .unwrap();
        let err = automaton
            .declare_action("a", ActionOptions::none(), None)
            .unwrap_err();
        assert_eq!(err, BuildError::DuplicateAction("a".to_string()));
    }

    #[test]
    fn late_action_is_rejected() {
        let mut automaton = Automaton::new();
        automaton.declare_state("s", false).unwrap();
        let err = automaton
            .declare_action("a", ActionOptions::none(), None)
            .unwrap_err();
        assert_eq!(err, BuildError::LateAction("a".to_string()));
    }

    #[test]
    fn duplicate_state_is_rejected() {
        let mut automaton = Automaton::new();
        automaton.declare_state("s", false).unwrap();
        let err = automaton.declare_state("s", false).unwrap_err();
        assert_eq!(err, BuildError::DuplicateState("s".to_string()));
    }

    #[test]
    fn action_out_of_order_is_rejected() {
        let mut automaton = Automaton::new();
        automaton
            .declare_action("a", ActionOptions::none(), None)
            .unwrap();
        automaton
            .declare_action("b", ActionOptions::none(), None)
            .unwrap();
        automaton
            .declare_action("c", ActionOptions::none(), None)
            .unwrap();
        let s = automaton.declare_state("s", false).unwrap();
        let err = automaton
            .add_transition(
                s,
                TransitionKey::chars("x"),
                "s",
                vec!["c".to_string(), "a".to_string()],
            )
            .unwrap_err();
        assert_eq!(err, BuildError::ActionOutOfOrder("a".to_string()));
    }

    #[test]
    fn overlap_is_reported_with_intersection() {
        let mut automaton = Automaton::new();
        let s = automaton.declare_state("s", false).unwrap();
        automaton
            .add_transition(s, TransitionKey::range('a' as u32, 'f' as u32), "s", vec![])
            .unwrap();
        let err = automaton
            .add_transition(s, TransitionKey::range('d' as u32, 'k' as u32), "s", vec![])
            .unwrap_err();
        match err {
            BuildError::OverlappingTransition { overlap, .. } => {
                assert_eq!(overlap, CharSet::from_range('d' as u32, 'f' as u32));
            }
            other => panic!("expected OverlappingTransition, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_default_is_rejected() {
        let mut automaton = Automaton::new();
        let s = automaton.declare_state("s", false).unwrap();
        automaton
            .add_transition(s, TransitionKey::Default, "s", vec![])
            .unwrap();
        let err = automaton
            .add_transition(s, TransitionKey::Default, "s", vec![])
            .unwrap_err();
        assert_eq!(err, BuildError::DuplicateDefault("s".to_string()));
    }

    #[test]
    fn frozen_automaton_rejects_mutation() {
        let mut automaton = Automaton::new();
        automaton.freeze();
        let err = automaton
            .declare_action("a", ActionOptions::none(), None)
            .unwrap_err();
        assert_eq!(err, BuildError::Frozen);
    }
}
