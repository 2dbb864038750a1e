//! Onboarding session: step navigation plus the collected form data.
//!
//! # Responsibility
//! - Track completed steps and derived progress while the user navigates.
//! - Submit the collected preferences to the settings backend once.
//!
//! # Invariants
//! - `state.current_step` always mirrors the controller's current step.
//! - A step is marked completed only when left by an accepted forward move.
//! - Submission is only possible from the last step.

use crate::model::onboarding::{OnboardingFormData, OnboardingStep, UserSettings};
use crate::onboarding::controller::{Step, StepChange, StepController, StepRules};
use crate::onboarding::rules::onboarding_rules;
use crate::ports::{AuthSession, NoticeLevel, Notifier, PortError, UserSettingsPort};
use log::{error, info};
use serde::Serialize;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnboardingError {
    NotOnFinalStep(OnboardingStep),
    IncompleteStep(OnboardingStep),
    NotSignedIn,
    Settings(PortError),
}

impl Display for OnboardingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotOnFinalStep(step) => {
                write!(f, "onboarding can only be submitted from the last step, currently at {step}")
            }
            Self::IncompleteStep(step) => write!(f, "onboarding step `{step}` is incomplete"),
            Self::NotSignedIn => write!(f, "a signed-in user is required to finish onboarding"),
            Self::Settings(err) => write!(f, "failed to save settings: {err}"),
        }
    }
}

impl Error for OnboardingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Settings(err) => Some(err),
            _ => None,
        }
    }
}

/// Snapshot of the onboarding flow exposed to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingState {
    pub current_step: OnboardingStep,
    pub completed_steps: BTreeSet<OnboardingStep>,
    pub form_data: OnboardingFormData,
    pub progress: f64,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for OnboardingState {
    fn default() -> Self {
        Self {
            current_step: OnboardingStep::SEQUENCE[0],
            completed_steps: BTreeSet::new(),
            form_data: OnboardingFormData::default(),
            progress: 0.0,
            is_loading: false,
            error: None,
        }
    }
}

pub struct OnboardingSession<N: Notifier> {
    controller: StepController<OnboardingStep, OnboardingState, N>,
    state: OnboardingState,
}

impl<N: Notifier> OnboardingSession<N> {
    /// Starts a session with the default onboarding rules.
    pub fn new(notifier: N) -> Self {
        Self::with_rules(onboarding_rules(), notifier)
    }

    pub fn with_rules(rules: StepRules<OnboardingStep, OnboardingState>, notifier: N) -> Self {
        Self {
            controller: StepController::new(rules, notifier),
            state: OnboardingState::default(),
        }
    }

    pub fn state(&self) -> &OnboardingState {
        &self.state
    }

    pub fn notifier(&self) -> &N {
        self.controller.notifier()
    }

    pub fn is_first_step(&self) -> bool {
        self.controller.is_first_step()
    }

    pub fn is_last_step(&self) -> bool {
        self.controller.is_last_step()
    }

    /// Edits the form payload in place.
    pub fn update_form(&mut self, edit: impl FnOnce(&mut OnboardingFormData)) {
        edit(&mut self.state.form_data);
        self.state.error = None;
    }

    pub fn go_to(&mut self, target: OnboardingStep) -> StepChange<OnboardingStep> {
        let change = self.controller.handle_step_change(target, &self.state);
        self.record(change)
    }

    pub fn next(&mut self) -> StepChange<OnboardingStep> {
        let change = self.controller.handle_next_step(&self.state);
        self.record(change)
    }

    pub fn previous(&mut self) -> StepChange<OnboardingStep> {
        let change = self.controller.handle_previous_step(&self.state);
        self.record(change)
    }

    /// Saves the collected preferences for the signed-in user.
    ///
    /// Failures are also recorded in `state.error`; the session stays usable
    /// for a retry.
    pub fn submit(
        &mut self,
        auth: &dyn AuthSession,
        settings_port: &dyn UserSettingsPort,
    ) -> Result<UserSettings, OnboardingError> {
        let result = self.try_submit(auth, settings_port);
        self.state.is_loading = false;
        match &result {
            Ok(_) => {
                self.state.error = None;
                self.state.completed_steps.insert(self.controller.current_step());
                self.refresh_progress();
                info!("event=onboarding_submit module=onboarding status=ok");
            }
            Err(err) => {
                self.state.error = Some(err.to_string());
                error!("event=onboarding_submit module=onboarding status=error error={err}");
            }
        }
        result
    }

    fn try_submit(
        &mut self,
        auth: &dyn AuthSession,
        settings_port: &dyn UserSettingsPort,
    ) -> Result<UserSettings, OnboardingError> {
        if !self.controller.is_last_step() {
            return Err(OnboardingError::NotOnFinalStep(self.controller.current_step()));
        }
        if let Some(step) = OnboardingStep::SEQUENCE
            .iter()
            .copied()
            .find(|step| !self.controller.rules().allows(*step, &self.state))
        {
            self.controller
                .notifier()
                .notify(NoticeLevel::Warning, &format!("Please complete the {step} step"));
            return Err(OnboardingError::IncompleteStep(step));
        }
        let user_id = auth.current_user().ok_or(OnboardingError::NotSignedIn)?;

        self.state.is_loading = true;
        let settings = UserSettings::from_onboarding(&self.state.form_data);
        settings_port
            .update_settings(&user_id, &settings)
            .map_err(OnboardingError::Settings)?;
        Ok(settings)
    }

    fn record(&mut self, change: StepChange<OnboardingStep>) -> StepChange<OnboardingStep> {
        if let StepChange::Moved { from, to } = change {
            if to.position() > from.position() {
                self.state.completed_steps.insert(from);
            }
            self.state.current_step = to;
            self.refresh_progress();
        }
        change
    }

    fn refresh_progress(&mut self) {
        let total = OnboardingStep::SEQUENCE.len() as f64;
        self.state.progress = (self.state.completed_steps.len() as f64 / total).min(1.0);
    }
}
