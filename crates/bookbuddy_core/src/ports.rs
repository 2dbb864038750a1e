//! Capability interfaces consumed by the core.
//!
//! # Responsibility
//! - Describe the backend, settings, session and notification surfaces the
//!   core depends on without binding to a concrete provider.
//! - Ship the small local implementations the core itself needs
//!   (log-routed and recording notifiers).
//!
//! # Invariants
//! - Port calls are synchronous from the core's point of view.
//! - Core logic never performs network I/O directly; it goes through ports.

use crate::model::book::{Book, BookId};
use crate::model::highlight::{Highlight, HighlightId};
use crate::model::onboarding::UserSettings;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

pub type PortResult<T> = Result<T, PortError>;

/// Error surfaced by any port implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortError {
    NotFound(String),
    Unauthorized,
    Backend(String),
}

impl Display for PortError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Backend(message) => write!(f, "backend failure: {message}"),
        }
    }
}

impl Error for PortError {}

/// Stable identifier of a signed-in user as issued by the auth provider.
pub type UserId = String;

/// Authoritative CRUD surface for books and highlights.
pub trait BookBackend {
    fn list_books(&self, user_id: &str) -> PortResult<Vec<Book>>;
    fn create_book(&self, user_id: &str, book: &Book) -> PortResult<BookId>;
    fn update_book(&self, user_id: &str, book: &Book) -> PortResult<()>;
    /// Deleting a book also deletes its highlights.
    fn delete_book(&self, user_id: &str, book_id: BookId) -> PortResult<()>;
    fn list_highlights(&self, user_id: &str) -> PortResult<Vec<Highlight>>;
    fn create_highlight(&self, user_id: &str, highlight: &Highlight) -> PortResult<HighlightId>;
    fn update_highlight(&self, user_id: &str, highlight: &Highlight) -> PortResult<()>;
    fn delete_highlight(&self, user_id: &str, highlight_id: HighlightId) -> PortResult<()>;
}

/// Per-user preferences and reading goals.
pub trait UserSettingsPort {
    fn get_settings(&self, user_id: &str) -> PortResult<Option<UserSettings>>;
    fn update_settings(&self, user_id: &str, settings: &UserSettings) -> PortResult<()>;
}

/// Current authentication session.
pub trait AuthSession {
    /// Signed-in user, or `None` when signed out.
    fn current_user(&self) -> Option<UserId>;
    fn sign_out(&self) -> PortResult<()>;
}

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// Toast/alert surface used to present rejection reasons.
pub trait Notifier {
    fn notify(&self, level: NoticeLevel, message: &str);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, level: NoticeLevel, message: &str) {
        (**self).notify(level, message)
    }
}

/// Routes notifications to the `log` facade. Used when no UI is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => info!("event=notify module=ports level=info message={message}"),
            NoticeLevel::Warning => {
                warn!("event=notify module=ports level=warning message={message}")
            }
        }
    }
}

/// Keeps every notification in memory, for tests and UI mocks.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeLevel, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices
            .lock()
            .map(|notices| notices.clone())
            .unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .map(|(_, message)| message)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push((level, message.to_string()));
        }
    }
}

/// Fixed session, for tests and mocks.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthSession {
    user: Option<UserId>,
}

impl StaticAuthSession {
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user: Some(user_id.into()),
        }
    }

    pub fn signed_out() -> Self {
        Self { user: None }
    }
}

impl AuthSession for StaticAuthSession {
    fn current_user(&self) -> Option<UserId> {
        self.user.clone()
    }

    fn sign_out(&self) -> PortResult<()> {
        Ok(())
    }
}
