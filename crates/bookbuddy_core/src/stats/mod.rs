//! Derived reading statistics for dashboards.
//!
//! # Invariants
//! - Every function here is pure; `now` is always passed in.
//! - Empty inputs yield zero counts and empty lists.

use crate::model::book::{Book, ReadingStatus};
use crate::model::highlight::Highlight;
use crate::model::onboarding::UserSettings;
use crate::ports::{PortResult, UserSettingsPort};
use crate::store::ReadingState;
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

/// Default number of entries returned by [`recent_highlights`].
pub const DEFAULT_RECENT_HIGHLIGHTS: usize = 5;

/// Completed books whose `completed_date` is in the same calendar month as `now`.
pub fn completed_in_month(books: &[Book], now: DateTime<Utc>) -> usize {
    completed_where(books, |date| {
        date.year() == now.year() && date.month() == now.month()
    })
}

/// Completed books whose `completed_date` is in the same calendar year as `now`.
pub fn completed_in_year(books: &[Book], now: DateTime<Utc>) -> usize {
    completed_where(books, |date| date.year() == now.year())
}

fn completed_where(books: &[Book], in_window: impl Fn(&DateTime<Utc>) -> bool) -> usize {
    books
        .iter()
        .filter(|book| book.status == ReadingStatus::Completed)
        .filter(|book| book.completed_date.as_ref().is_some_and(&in_window))
        .count()
}

/// Newest-first highlights, truncated to `limit`.
///
/// Equal timestamps keep their insertion order.
pub fn recent_highlights(highlights: &[Highlight], limit: usize) -> Vec<&Highlight> {
    let mut sorted: Vec<&Highlight> = highlights.iter().collect();
    sorted.sort_by(|left, right| right.created_at.cmp(&left.created_at));
    sorted.truncate(limit);
    sorted
}

/// Dashboard summary over one store snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingStats {
    pub total_books: usize,
    pub not_started: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub completed_this_month: usize,
    pub completed_this_year: usize,
    pub pages_read: u64,
    pub total_highlights: usize,
    pub favorite_highlights: usize,
}

impl ReadingStats {
    pub fn compute(state: &ReadingState, now: DateTime<Utc>) -> Self {
        let count = |status: ReadingStatus| state.books_with_status(status).count();
        Self {
            total_books: state.books.len(),
            not_started: count(ReadingStatus::NotStarted),
            in_progress: count(ReadingStatus::InProgress),
            completed: count(ReadingStatus::Completed),
            completed_this_month: completed_in_month(&state.books, now),
            completed_this_year: completed_in_year(&state.books, now),
            pages_read: state
                .books
                .iter()
                .map(|book| u64::from(book.pages_read()))
                .sum(),
            total_highlights: state.highlights.len(),
            favorite_highlights: state.favorite_highlights().count(),
        }
    }
}

/// Progress toward the goals chosen during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub monthly_goal: u32,
    pub monthly_completed: usize,
    pub yearly_goal: u32,
    pub yearly_completed: usize,
}

impl GoalProgress {
    pub fn compute(stats: &ReadingStats, settings: &UserSettings) -> Self {
        Self {
            monthly_goal: settings.monthly_goal,
            monthly_completed: stats.completed_this_month,
            yearly_goal: settings.yearly_goal,
            yearly_completed: stats.completed_this_year,
        }
    }

    /// Loads `user_id`'s saved goals; `None` when onboarding never saved any.
    pub fn for_user(
        stats: &ReadingStats,
        settings_port: &dyn UserSettingsPort,
        user_id: &str,
    ) -> PortResult<Option<Self>> {
        Ok(settings_port
            .get_settings(user_id)?
            .map(|settings| Self::compute(stats, &settings)))
    }

    /// A zero goal counts as unset and is never met.
    pub fn monthly_met(&self) -> bool {
        self.monthly_goal > 0 && self.monthly_completed >= self.monthly_goal as usize
    }

    pub fn yearly_met(&self) -> bool {
        self.yearly_goal > 0 && self.yearly_completed >= self.yearly_goal as usize
    }
}
