//! Onboarding preference payloads.
//!
//! # Responsibility
//! - Define the step identifiers of the first-run flow.
//! - Define the preference payload (genres, goals, weekly schedule) and the
//!   persisted user-settings record produced on submission.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Steps of the first-run onboarding flow, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    Welcome,
    Genres,
    Goals,
    Schedule,
    Complete,
}

impl OnboardingStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Genres => "genres",
            Self::Goals => "goals",
            Self::Schedule => "schedule",
            Self::Complete => "complete",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "welcome" => Some(Self::Welcome),
            "genres" => Some(Self::Genres),
            "goals" => Some(Self::Goals),
            "schedule" => Some(Self::Schedule),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }
}

impl Display for OnboardingStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One weekly reading slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSlot {
    pub day: Weekday,
    /// Local time of day, `HH:MM` in 24h form.
    pub time: String,
    pub notify: bool,
}

/// Preferences collected across onboarding steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingFormData {
    pub genres: Vec<String>,
    pub monthly_goal: u32,
    pub yearly_goal: u32,
    pub schedule: Vec<ScheduleSlot>,
}

/// User settings as stored by the settings backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub genres: Vec<String>,
    pub monthly_goal: u32,
    pub yearly_goal: u32,
    pub schedule: Vec<ScheduleSlot>,
    pub onboarding_completed: bool,
}

impl UserSettings {
    /// Builds the settings record submitted at the end of onboarding.
    pub fn from_onboarding(form: &OnboardingFormData) -> Self {
        Self {
            genres: normalize_genres(&form.genres),
            monthly_goal: form.monthly_goal,
            yearly_goal: form.yearly_goal,
            schedule: form.schedule.clone(),
            onboarding_completed: true,
        }
    }
}

/// Trims, lowercases and deduplicates genre names, keeping first-seen order.
pub fn normalize_genres(genres: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(genres.len());
    for genre in genres {
        let value = genre.trim().to_lowercase();
        if value.is_empty() || normalized.contains(&value) {
            continue;
        }
        normalized.push(value);
    }
    normalized
}
