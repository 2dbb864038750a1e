//! Core domain logic for BookBuddy.
//! This crate is the single source of truth for reading-state invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod onboarding;
pub mod ports;
pub mod repo;
pub mod service;
pub mod stats;
pub mod store;

pub use config::{ConfigError, CoreConfig};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::book::{Book, BookId, BookValidationError, ReadingStatus};
pub use model::highlight::{Highlight, HighlightId, HighlightValidationError};
pub use model::onboarding::{OnboardingFormData, OnboardingStep, ScheduleSlot, UserSettings};
pub use onboarding::controller::{Step, StepChange, StepController, StepRules};
pub use onboarding::rules::onboarding_rules;
pub use onboarding::session::{OnboardingError, OnboardingSession, OnboardingState};
pub use ports::{
    AuthSession, BookBackend, LogNotifier, NoticeLevel, Notifier, PortError, PortResult,
    RecordingNotifier, StaticAuthSession, UserSettingsPort,
};
pub use repo::settings_repo::SqliteUserSettingsRepository;
pub use service::library_service::{LibraryResult, LibraryService, LibraryServiceError};
pub use service::status_transition::{
    can_change_status, StatusChangeDecision, StatusChangeRejection,
};
pub use stats::{
    completed_in_month, completed_in_year, recent_highlights, GoalProgress, ReadingStats,
    DEFAULT_RECENT_HIGHLIGHTS,
};
pub use store::storage::{
    MemorySnapshotStorage, SnapshotStorage, SqliteSnapshotStorage, StorageError,
};
pub use store::{HydrationOutcome, ReadingState, ReadingStore};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
