//! Generic step-sequence controller.
//!
//! # Invariants
//! - `current` is always a member of `S::SEQUENCE`.
//! - Steps without a registered rule are always allowed to advance.
//! - Rejected moves leave `current` untouched and never fire the callback.

use crate::ports::{NoticeLevel, Notifier};
use log::debug;
use std::fmt::Debug;

/// Message raised when a forward move fails its step rule.
pub const INCOMPLETE_STEP_MESSAGE: &str = "Please complete this step";

/// A closed, ordered set of step tags.
pub trait Step: Copy + Eq + Debug + 'static {
    /// Steps in navigation order. Must be non-empty and list every variant
    /// exactly once; [`StepController::new`] starts at `SEQUENCE[0]`.
    const SEQUENCE: &'static [Self];

    /// Index of `self` in [`Step::SEQUENCE`].
    ///
    /// A variant missing from the sequence is an implementation bug: debug
    /// builds panic, release builds treat it as the first step.
    fn position(self) -> usize {
        let position = Self::SEQUENCE.iter().position(|step| *step == self);
        debug_assert!(
            position.is_some(),
            "{self:?} is missing from Step::SEQUENCE"
        );
        position.unwrap_or(0)
    }
}

pub type StepPredicate<T> = fn(&T) -> bool;

/// Validation table keyed by step.
pub struct StepRules<S, T> {
    rules: Vec<(S, StepPredicate<T>)>,
}

impl<S: Step, T> StepRules<S, T> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Registers (or replaces) the rule guarding `step`.
    pub fn with_rule(mut self, step: S, predicate: StepPredicate<T>) -> Self {
        self.rules.retain(|(existing, _)| *existing != step);
        self.rules.push((step, predicate));
        self
    }

    pub fn has_rule(&self, step: S) -> bool {
        self.rules.iter().any(|(existing, _)| *existing == step)
    }

    /// Whether `state` satisfies the rule for `step`; missing rules pass.
    pub fn allows(&self, step: S, state: &T) -> bool {
        self.rules
            .iter()
            .find(|(existing, _)| *existing == step)
            .map_or(true, |(_, predicate)| predicate(state))
    }
}

impl<S: Step, T> Default for StepRules<S, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Observable result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepChange<S> {
    Moved { from: S, to: S },
    /// Target is more than one step ahead; ignored silently.
    SkippedAhead { from: S, to: S },
    /// Current step's rule failed; user was notified.
    Blocked { step: S },
    /// Next/previous requested at the edge of the sequence.
    AtBoundary { step: S },
}

impl<S> StepChange<S> {
    pub fn is_moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

type StepCallback<S> = Box<dyn FnMut(S, S) + Send>;

/// Finite-state stepper over `S::SEQUENCE`, validating against `T`.
pub struct StepController<S: Step, T, N: Notifier> {
    current: S,
    rules: StepRules<S, T>,
    notifier: N,
    on_step_change: Option<StepCallback<S>>,
}

impl<S: Step, T, N: Notifier> StepController<S, T, N> {
    /// Starts at the first step of the sequence.
    ///
    /// # Panics
    /// If `S::SEQUENCE` is empty.
    pub fn new(rules: StepRules<S, T>, notifier: N) -> Self {
        Self::starting_at(S::SEQUENCE[0], rules, notifier)
    }

    pub fn starting_at(step: S, rules: StepRules<S, T>, notifier: N) -> Self {
        Self {
            current: step,
            rules,
            notifier,
            on_step_change: None,
        }
    }

    /// Installs a callback fired with `(from, to)` after each accepted move.
    pub fn on_step_change(mut self, callback: impl FnMut(S, S) + Send + 'static) -> Self {
        self.on_step_change = Some(Box::new(callback));
        self
    }

    pub fn current_step(&self) -> S {
        self.current
    }

    pub fn rules(&self) -> &StepRules<S, T> {
        &self.rules
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn is_first_step(&self) -> bool {
        self.current.position() == 0
    }

    pub fn is_last_step(&self) -> bool {
        self.current.position() + 1 == S::SEQUENCE.len()
    }

    /// Moves to `target` unless it skips ahead or the current step is incomplete.
    pub fn handle_step_change(&mut self, target: S, state: &T) -> StepChange<S> {
        let from = self.current;
        let from_index = from.position();
        let target_index = target.position();

        if target_index > from_index + 1 {
            debug!(
                "event=step_change module=onboarding status=skipped from={:?} to={:?}",
                from, target
            );
            return StepChange::SkippedAhead { from, to: target };
        }

        if target_index > from_index && !self.rules.allows(from, state) {
            self.notifier
                .notify(NoticeLevel::Warning, INCOMPLETE_STEP_MESSAGE);
            debug!(
                "event=step_change module=onboarding status=blocked step={:?}",
                from
            );
            return StepChange::Blocked { step: from };
        }

        self.current = target;
        if let Some(callback) = self.on_step_change.as_mut() {
            callback(from, target);
        }
        StepChange::Moved { from, to: target }
    }

    pub fn handle_next_step(&mut self, state: &T) -> StepChange<S> {
        match S::SEQUENCE.get(self.current.position() + 1) {
            Some(next) => self.handle_step_change(*next, state),
            None => StepChange::AtBoundary {
                step: self.current,
            },
        }
    }

    pub fn handle_previous_step(&mut self, state: &T) -> StepChange<S> {
        match self.current.position().checked_sub(1) {
            Some(index) => self.handle_step_change(S::SEQUENCE[index], state),
            None => StepChange::AtBoundary {
                step: self.current,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Step, StepChange, StepController, StepRules};
    use crate::ports::RecordingNotifier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Wizard {
        Intro,
        Details,
        Done,
    }

    impl Step for Wizard {
        const SEQUENCE: &'static [Self] = &[Wizard::Intro, Wizard::Details, Wizard::Done];
    }

    fn details_filled(value: &u32) -> bool {
        *value > 0
    }

    #[test]
    fn unrelated_step_set_works_without_rules() {
        let mut controller =
            StepController::<Wizard, u32, _>::new(StepRules::new(), RecordingNotifier::new());
        assert!(controller.is_first_step());
        assert!(controller.handle_next_step(&0).is_moved());
        assert!(controller.handle_next_step(&0).is_moved());
        assert!(controller.is_last_step());
        assert_eq!(
            controller.handle_next_step(&0),
            StepChange::AtBoundary { step: Wizard::Done }
        );
    }

    #[test]
    fn backward_jumps_ignore_rules_and_distance() {
        let rules = StepRules::new().with_rule(Wizard::Done, details_filled);
        let mut controller =
            StepController::starting_at(Wizard::Done, rules, RecordingNotifier::new());
        assert_eq!(
            controller.handle_step_change(Wizard::Intro, &0),
            StepChange::Moved {
                from: Wizard::Done,
                to: Wizard::Intro
            }
        );
    }

    #[test]
    fn callback_fires_only_on_accepted_moves() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let rules = StepRules::new().with_rule(Wizard::Details, details_filled);
        let mut controller = StepController::new(rules, RecordingNotifier::new())
            .on_step_change(move |_, _| {
                seen.fetch_add(1, Ordering::SeqCst);
            });

        controller.handle_next_step(&0);
        assert_eq!(
            controller.handle_next_step(&0),
            StepChange::Blocked {
                step: Wizard::Details
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.notifier().messages(), vec!["Please complete this step"]);
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Unlisted {
        Listed,
        Forgotten,
    }

    impl Step for Unlisted {
        const SEQUENCE: &'static [Self] = &[Unlisted::Listed];
    }

    #[test]
    fn positions_follow_sequence_order() {
        assert_eq!(Wizard::Intro.position(), 0);
        assert_eq!(Wizard::Done.position(), 2);
        assert_eq!(Unlisted::Listed.position(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "missing from Step::SEQUENCE")]
    fn step_missing_from_sequence_fails_loudly_in_debug_builds() {
        let _ = Unlisted::Forgotten.position();
    }
}
