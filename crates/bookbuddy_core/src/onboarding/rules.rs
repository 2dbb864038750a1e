//! BookBuddy onboarding step sequence and completion rules.
//!
//! # Invariants
//! - `Welcome` and `Complete` have no rule.
//! - Schedule times are 24h `HH:MM`.

use crate::model::onboarding::OnboardingStep;
use crate::onboarding::controller::{Step, StepRules};
use crate::onboarding::session::OnboardingState;
use once_cell::sync::Lazy;
use regex::Regex;

static TIME_OF_DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("valid time-of-day regex"));

impl Step for OnboardingStep {
    const SEQUENCE: &'static [Self] = &[
        OnboardingStep::Welcome,
        OnboardingStep::Genres,
        OnboardingStep::Goals,
        OnboardingStep::Schedule,
        OnboardingStep::Complete,
    ];
}

/// Default rule table for the onboarding flow.
pub fn onboarding_rules() -> StepRules<OnboardingStep, OnboardingState> {
    StepRules::new()
        .with_rule(OnboardingStep::Genres, genres_selected)
        .with_rule(OnboardingStep::Goals, goals_set)
        .with_rule(OnboardingStep::Schedule, schedule_set)
}

/// Whether `value` is a 24h `HH:MM` time.
pub fn is_valid_time_of_day(value: &str) -> bool {
    TIME_OF_DAY_RE.is_match(value)
}

fn genres_selected(state: &OnboardingState) -> bool {
    state
        .form_data
        .genres
        .iter()
        .any(|genre| !genre.trim().is_empty())
}

fn goals_set(state: &OnboardingState) -> bool {
    let form = &state.form_data;
    form.monthly_goal >= 1 && form.yearly_goal >= 1 && form.yearly_goal >= form.monthly_goal
}

fn schedule_set(state: &OnboardingState) -> bool {
    let schedule = &state.form_data.schedule;
    !schedule.is_empty() && schedule.iter().all(|slot| is_valid_time_of_day(&slot.time))
}
