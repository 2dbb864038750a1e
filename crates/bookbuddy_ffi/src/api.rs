//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Own the process-wide library and onboarding session behind mutexes.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Ids cross the boundary as UUID strings; statuses as wire labels.
//! - Business rejections come back as `ok=false` with the user-facing reason.

use bookbuddy_core::{
    can_change_status, core_version as core_version_inner, init_logging as init_logging_inner,
    ping as ping_inner, recent_highlights, Book, CoreConfig, GoalProgress, Highlight,
    LibraryService,
    LogNotifier, OnboardingSession, OnboardingStep, ReadingStats, ReadingStatus, ReadingStore,
    ScheduleSlot, SqliteSnapshotStorage, SqliteUserSettingsRepository, StaticAuthSession,
    StepChange, DEFAULT_RECENT_HIGHLIGHTS,
};
use bookbuddy_core::db::open_db;
use bookbuddy_core::onboarding::controller::INCOMPLETE_STEP_MESSAGE;
use bookbuddy_core::service::library_service::{FAVORITE_ADDED_MESSAGE, FAVORITE_REMOVED_MESSAGE};
use chrono::{Utc, Weekday};
use log::{error, warn};
use std::sync::{Mutex, OnceLock};
use uuid::Uuid;

const RECENT_HIGHLIGHTS_MAX: u32 = 20;

type Library = LibraryService<SqliteSnapshotStorage, LogNotifier>;

static LIBRARY: OnceLock<Mutex<Library>> = OnceLock::new();
static ONBOARDING: OnceLock<Mutex<OnboardingSession<LogNotifier>>> = OnceLock::new();
static CONFIG: OnceLock<CoreConfig> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Core crate version.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Generic action envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Id of the created or affected record.
    pub id: Option<String>,
    /// Human-readable message for diagnostics or a toast.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: impl ToString) -> Self {
        Self {
            ok: true,
            id: Some(id.to_string()),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookItem {
    pub id: String,
    pub title: String,
    pub author: String,
    pub cover_url: Option<String>,
    pub total_pages: u32,
    pub current_page: Option<u32>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightItem {
    pub id: String,
    pub book_id: String,
    pub text: String,
    pub page: u32,
    pub is_favorite: bool,
    pub created_at_epoch_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCheckResponse {
    pub allowed: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardResponse {
    pub total_books: u32,
    pub in_progress: u32,
    pub completed_this_month: u32,
    pub completed_this_year: u32,
    pub favorite_highlights: u32,
    pub recent_highlights: Vec<HighlightItem>,
    /// Progress against saved onboarding goals; `None` without a user or settings.
    pub goals: Option<GoalProgressItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalProgressItem {
    pub monthly_goal: u32,
    pub monthly_completed: u32,
    pub monthly_met: bool,
    pub yearly_goal: u32,
    pub yearly_completed: u32,
    pub yearly_met: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OnboardingView {
    pub current_step: String,
    pub completed_steps: Vec<String>,
    pub progress: f64,
    pub is_first_step: bool,
    pub is_last_step: bool,
    pub error: Option<String>,
    /// Outcome of the last navigation request, empty when it was accepted.
    pub message: String,
}

/// Adds a not-started book to the library.
#[flutter_rust_bridge::frb(sync)]
pub fn library_add_book(
    title: String,
    author: String,
    total_pages: u32,
    cover_url: Option<String>,
) -> ActionResponse {
    let mut book = Book::new(title.trim(), author.trim(), total_pages);
    book.cover_url = cover_url.filter(|url| !url.trim().is_empty());
    let book_id = book.id;
    with_library(|library| library.add_book(book).map_err(|err| err.to_string()))
        .map_or_else(ActionResponse::failure, |_| {
            ActionResponse::success("Book added.", book_id)
        })
}

/// Records the current page of a book.
#[flutter_rust_bridge::frb(sync)]
pub fn library_record_progress(book_id: String, current_page: u32) -> ActionResponse {
    let result = parse_id(&book_id).and_then(|id| {
        with_library(|library| {
            library
                .record_progress(id, current_page, Utc::now())
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(_) => ActionResponse::success("Progress saved.", book_id),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Checks a status change without applying it, for enabling UI options.
#[flutter_rust_bridge::frb(sync)]
pub fn library_check_status_change(book_id: String, status: String) -> StatusCheckResponse {
    let checked = parse_id(&book_id).and_then(|id| {
        let target = parse_status(&status)?;
        with_library(|library| {
            let state = library.state();
            let book = state
                .book(id)
                .ok_or_else(|| format!("book not found: {id}"))?;
            let is_only_book = book.status == ReadingStatus::InProgress
                && state.books_with_status(ReadingStatus::InProgress).count() == 1;
            Ok(can_change_status(book, target, is_only_book))
        })
    });
    match checked {
        Ok(decision) => StatusCheckResponse {
            allowed: decision.allowed(),
            reason: decision.reason().map(str::to_string),
        },
        Err(message) => StatusCheckResponse {
            allowed: false,
            reason: Some(message),
        },
    }
}

/// Applies a status change; rejection reasons come back in `message`.
#[flutter_rust_bridge::frb(sync)]
pub fn library_change_status(book_id: String, status: String) -> ActionResponse {
    let result = parse_id(&book_id).and_then(|id| {
        let target = parse_status(&status)?;
        with_library(|library| {
            library
                .change_status(id, target, Utc::now())
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(_) => ActionResponse::success("Status updated.", book_id),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Lists tracked books in insertion order.
#[flutter_rust_bridge::frb(sync)]
pub fn library_books() -> Vec<BookItem> {
    with_library(|library| Ok(library.state().books.iter().map(to_book_item).collect()))
        .unwrap_or_default()
}

/// Adds a highlight to an existing book.
#[flutter_rust_bridge::frb(sync)]
pub fn highlight_add(book_id: String, text: String, page: u32) -> ActionResponse {
    let result = parse_id(&book_id).and_then(|id| {
        let highlight = Highlight::new(id, text.trim(), page, Utc::now());
        let highlight_id = highlight.id;
        with_library(|library| {
            library
                .add_highlight(highlight)
                .map(|_| highlight_id)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(highlight_id) => ActionResponse::success("Highlight saved.", highlight_id),
        Err(message) => ActionResponse::failure(message),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn highlight_toggle_favorite(highlight_id: String) -> ActionResponse {
    let result = parse_id(&highlight_id).and_then(|id| {
        with_library(|library| {
            let state = library.toggle_favorite_highlight(id);
            Ok(state.highlight(id).map(|highlight| highlight.is_favorite))
        })
    });
    match result {
        Ok(Some(true)) => ActionResponse::success(FAVORITE_ADDED_MESSAGE, highlight_id),
        Ok(Some(false)) => ActionResponse::success(FAVORITE_REMOVED_MESSAGE, highlight_id),
        Ok(None) => ActionResponse::failure(format!("highlight not found: {highlight_id}")),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Dashboard counters plus newest highlights (`limit` defaults to 5, max 20).
///
/// With a `user_id`, goal progress is read from that user's saved settings.
#[flutter_rust_bridge::frb(sync)]
pub fn dashboard(user_id: Option<String>, limit: Option<u32>) -> DashboardResponse {
    let limit = normalize_recent_limit(limit);
    let built = with_library(|library| {
        let state = library.state();
        let stats = ReadingStats::compute(&state, Utc::now());
        Ok(DashboardResponse {
            total_books: saturating_u32(stats.total_books),
            in_progress: saturating_u32(stats.in_progress),
            completed_this_month: saturating_u32(stats.completed_this_month),
            completed_this_year: saturating_u32(stats.completed_this_year),
            favorite_highlights: saturating_u32(stats.favorite_highlights),
            recent_highlights: recent_highlights(&state.highlights, limit as usize)
                .into_iter()
                .map(to_highlight_item)
                .collect(),
            goals: user_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .and_then(|id| load_goals(&stats, id)),
        })
    });
    built.unwrap_or_else(|message| {
        error!("event=dashboard module=ffi status=error error={message}");
        DashboardResponse {
            total_books: 0,
            in_progress: 0,
            completed_this_month: 0,
            completed_this_year: 0,
            favorite_highlights: 0,
            recent_highlights: Vec::new(),
            goals: None,
        }
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn onboarding_state() -> OnboardingView {
    with_onboarding(|_| String::new())
}

#[flutter_rust_bridge::frb(sync)]
pub fn onboarding_set_genres(genres: Vec<String>) -> OnboardingView {
    with_onboarding(|session| {
        session.update_form(|form| form.genres = genres);
        String::new()
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn onboarding_set_goals(monthly_goal: u32, yearly_goal: u32) -> OnboardingView {
    with_onboarding(|session| {
        session.update_form(|form| {
            form.monthly_goal = monthly_goal;
            form.yearly_goal = yearly_goal;
        });
        String::new()
    })
}

/// Adds a weekly slot; `day` accepts `mon`/`monday` style names.
#[flutter_rust_bridge::frb(sync)]
pub fn onboarding_add_schedule_slot(day: String, time: String, notify: bool) -> OnboardingView {
    with_onboarding(|session| match day.trim().parse::<Weekday>() {
        Ok(day) => {
            session.update_form(|form| {
                form.schedule.push(ScheduleSlot {
                    day,
                    time: time.trim().to_string(),
                    notify,
                })
            });
            String::new()
        }
        Err(_) => format!("unknown weekday `{day}`"),
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn onboarding_next() -> OnboardingView {
    with_onboarding(|session| describe_change(session.next()))
}

#[flutter_rust_bridge::frb(sync)]
pub fn onboarding_previous() -> OnboardingView {
    with_onboarding(|session| describe_change(session.previous()))
}

#[flutter_rust_bridge::frb(sync)]
pub fn onboarding_go_to(step: String) -> OnboardingView {
    with_onboarding(|session| match OnboardingStep::parse(&step) {
        Some(target) => describe_change(session.go_to(target)),
        None => format!("unknown onboarding step `{step}`"),
    })
}

/// Saves onboarding preferences for `user_id` in the local settings table.
#[flutter_rust_bridge::frb(sync)]
pub fn onboarding_submit(user_id: String) -> ActionResponse {
    let user_id = user_id.trim().to_string();
    let conn = match open_db(&config().db_path) {
        Ok(conn) => conn,
        Err(err) => return ActionResponse::failure(format!("onboarding_submit failed: {err}")),
    };
    let repo = SqliteUserSettingsRepository::new(&conn);
    let auth = if user_id.is_empty() {
        StaticAuthSession::signed_out()
    } else {
        StaticAuthSession::signed_in(user_id.clone())
    };

    let Ok(mut session) = onboarding_session().lock() else {
        return ActionResponse::failure("onboarding session is unavailable");
    };
    match session.submit(&auth, &repo) {
        Ok(_) => ActionResponse::success("Onboarding complete.", user_id),
        Err(err) => ActionResponse::failure(err.to_string()),
    }
}

/// Goal lookup failures only drop the goal section of the dashboard.
fn load_goals(stats: &ReadingStats, user_id: &str) -> Option<GoalProgressItem> {
    let conn = match open_db(&config().db_path) {
        Ok(conn) => conn,
        Err(err) => {
            warn!(
                "event=dashboard_goals module=ffi status=error error_code={} error={err}",
                err.code()
            );
            return None;
        }
    };
    let repo = SqliteUserSettingsRepository::new(&conn);
    match GoalProgress::for_user(stats, &repo, user_id) {
        Ok(progress) => progress.map(to_goal_item),
        Err(err) => {
            warn!("event=dashboard_goals module=ffi status=error error={err}");
            None
        }
    }
}

fn to_goal_item(progress: GoalProgress) -> GoalProgressItem {
    GoalProgressItem {
        monthly_goal: progress.monthly_goal,
        monthly_completed: saturating_u32(progress.monthly_completed),
        monthly_met: progress.monthly_met(),
        yearly_goal: progress.yearly_goal,
        yearly_completed: saturating_u32(progress.yearly_completed),
        yearly_met: progress.yearly_met(),
    }
}

fn config() -> &'static CoreConfig {
    CONFIG.get_or_init(|| {
        CoreConfig::from_env().unwrap_or_else(|err| {
            error!("event=config_load module=ffi status=error error={err}");
            CoreConfig::default()
        })
    })
}

fn with_library<T>(f: impl FnOnce(&mut Library) -> Result<T, String>) -> Result<T, String> {
    if LIBRARY.get().is_none() {
        let config = config();
        let storage = SqliteSnapshotStorage::open(&config.db_path)
            .map_err(|err| format!("library storage open failed: {err}"))?;
        let store = ReadingStore::with_key(storage, config.snapshot_key.clone());
        let _ = LIBRARY.set(Mutex::new(LibraryService::new(store, LogNotifier)));
    }
    let library = LIBRARY
        .get()
        .ok_or_else(|| "library is unavailable".to_string())?;
    let mut guard = library
        .lock()
        .map_err(|_| "library lock poisoned".to_string())?;
    f(&mut guard)
}

fn onboarding_session() -> &'static Mutex<OnboardingSession<LogNotifier>> {
    ONBOARDING.get_or_init(|| Mutex::new(OnboardingSession::new(LogNotifier)))
}

fn with_onboarding(f: impl FnOnce(&mut OnboardingSession<LogNotifier>) -> String) -> OnboardingView {
    match onboarding_session().lock() {
        Ok(mut session) => {
            let message = f(&mut session);
            to_onboarding_view(&session, message)
        }
        Err(_) => OnboardingView {
            current_step: OnboardingStep::Welcome.to_string(),
            completed_steps: Vec::new(),
            progress: 0.0,
            is_first_step: true,
            is_last_step: false,
            error: Some("onboarding session is unavailable".to_string()),
            message: String::new(),
        },
    }
}

fn describe_change(change: StepChange<OnboardingStep>) -> String {
    match change {
        StepChange::Moved { .. } => String::new(),
        StepChange::Blocked { .. } => INCOMPLETE_STEP_MESSAGE.to_string(),
        StepChange::SkippedAhead { .. } => "Steps cannot be skipped.".to_string(),
        StepChange::AtBoundary { .. } => "No further step in this direction.".to_string(),
    }
}

fn to_onboarding_view(session: &OnboardingSession<LogNotifier>, message: String) -> OnboardingView {
    let state = session.state();
    OnboardingView {
        current_step: state.current_step.to_string(),
        completed_steps: state
            .completed_steps
            .iter()
            .map(ToString::to_string)
            .collect(),
        progress: state.progress,
        is_first_step: session.is_first_step(),
        is_last_step: session.is_last_step(),
        error: state.error.clone(),
        message,
    }
}

fn parse_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid id `{raw}`"))
}

fn parse_status(raw: &str) -> Result<ReadingStatus, String> {
    ReadingStatus::parse(raw).ok_or_else(|| format!("unknown reading status `{raw}`"))
}

fn normalize_recent_limit(limit: Option<u32>) -> u32 {
    match limit {
        None | Some(0) => DEFAULT_RECENT_HIGHLIGHTS as u32,
        Some(value) => value.min(RECENT_HIGHLIGHTS_MAX),
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn to_book_item(book: &Book) -> BookItem {
    BookItem {
        id: book.id.to_string(),
        title: book.title.clone(),
        author: book.author.clone(),
        cover_url: book.cover_url.clone(),
        total_pages: book.total_pages,
        current_page: book.current_page,
        status: book.status.as_str().to_string(),
    }
}

fn to_highlight_item(highlight: &Highlight) -> HighlightItem {
    HighlightItem {
        id: highlight.id.to_string(),
        book_id: highlight.book_id.to_string(),
        text: highlight.text.clone(),
        page: highlight.page,
        is_favorite: highlight.is_favorite,
        created_at_epoch_ms: highlight.created_at.timestamp_millis(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        config, core_version, dashboard, highlight_add, highlight_toggle_favorite, init_logging,
        library_add_book, library_books, library_change_status, library_check_status_change,
        library_record_progress, normalize_recent_limit, ping,
    };
    use bookbuddy_core::db::open_db;
    use bookbuddy_core::{
        OnboardingFormData, SqliteUserSettingsRepository, UserSettings, UserSettingsPort,
    };

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn recent_limit_defaults_and_clamps() {
        assert_eq!(normalize_recent_limit(None), 5);
        assert_eq!(normalize_recent_limit(Some(0)), 5);
        assert_eq!(normalize_recent_limit(Some(99)), 20);
    }

    #[test]
    fn book_lifecycle_through_ffi() {
        let added = library_add_book("Dune".to_string(), "Frank Herbert".to_string(), 412, None);
        assert!(added.ok, "{}", added.message);
        let book_id = added.id.expect("book id");
        assert!(library_books().iter().any(|book| book.id == book_id));

        let progress = library_record_progress(book_id.clone(), 50);
        assert!(progress.ok, "{}", progress.message);
        let stored = library_books()
            .into_iter()
            .find(|book| book.id == book_id)
            .expect("book listed");
        assert_eq!(stored.status, "IN_PROGRESS");

        let done = library_change_status(book_id.clone(), "completed".to_string());
        assert!(done.ok, "{}", done.message);

        let check = library_check_status_change(book_id.clone(), "not_started".to_string());
        assert!(!check.allowed);
        assert_eq!(
            check.reason.as_deref(),
            Some("Cannot change a completed book back to not started")
        );

        let rejected = library_change_status(book_id.clone(), "NOT_STARTED".to_string());
        assert!(!rejected.ok);

        let highlight = highlight_add(book_id, "The spice must flow".to_string(), 10);
        assert!(highlight.ok, "{}", highlight.message);
        let highlight_id = highlight.id.expect("highlight id");
        let favorite = highlight_toggle_favorite(highlight_id.clone());
        assert_eq!(favorite.message, "Added to favorites");

        let dash = dashboard(None, Some(20));
        assert!(dash.recent_highlights.iter().any(|item| item.id == highlight_id));
    }

    #[test]
    fn dashboard_reports_saved_goals_for_the_user() {
        let user_id = format!("reader-{}", uuid::Uuid::new_v4());
        let conn = open_db(&config().db_path).expect("open db");
        let settings = UserSettings::from_onboarding(&OnboardingFormData {
            monthly_goal: 0,
            yearly_goal: 10_000,
            ..OnboardingFormData::default()
        });
        SqliteUserSettingsRepository::new(&conn)
            .update_settings(&user_id, &settings)
            .expect("save settings");

        let goals = dashboard(Some(user_id), None).goals.expect("goals");
        assert_eq!(goals.monthly_goal, 0);
        assert!(!goals.monthly_met);
        assert_eq!(goals.yearly_goal, 10_000);
        assert!(!goals.yearly_met);

        let unknown = format!("reader-{}", uuid::Uuid::new_v4());
        assert_eq!(dashboard(Some(unknown), None).goals, None);
        assert_eq!(dashboard(None, None).goals, None);
    }

    #[test]
    fn invalid_ids_are_reported_not_panicked() {
        let response = library_record_progress("not-a-uuid".to_string(), 1);
        assert!(!response.ok);
        assert!(response.message.contains("invalid id"));
    }
}
