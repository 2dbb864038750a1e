//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `bookbuddy_core` linkage outside the Flutter runtime.
//! - Print a deterministic summary of the locally persisted library.
//!
//! Usage: `bookbuddy_cli [USER_ID]`; with a user id, goal progress from that
//! user's saved onboarding settings is printed as well.

use bookbuddy_core::db::open_db;
use bookbuddy_core::{
    core_version, init_logging_from_config, ping, recent_highlights, CoreConfig, GoalProgress,
    ReadingStats, ReadingStore, SqliteSnapshotStorage, SqliteUserSettingsRepository,
    DEFAULT_RECENT_HIGHLIGHTS,
};
use chrono::Utc;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is normal; only the process environment is used then.
    let _ = dotenvy::dotenv();
    let config = CoreConfig::from_env()?;
    init_logging_from_config(&config)?;

    println!("bookbuddy_core ping={}", ping());
    println!("bookbuddy_core version={}", core_version());
    println!("db_path={}", config.db_path.display());

    let storage = SqliteSnapshotStorage::open(&config.db_path)?;
    let mut store = ReadingStore::with_key(storage, config.snapshot_key.clone());
    let outcome = store.hydrate();
    println!("hydration={outcome:?}");

    let state = store.state();
    let stats = ReadingStats::compute(&state, Utc::now());
    println!(
        "books total={} not_started={} in_progress={} completed={}",
        stats.total_books, stats.not_started, stats.in_progress, stats.completed
    );
    println!(
        "completed this_month={} this_year={} pages_read={}",
        stats.completed_this_month, stats.completed_this_year, stats.pages_read
    );
    println!(
        "highlights total={} favorites={}",
        stats.total_highlights, stats.favorite_highlights
    );
    for highlight in recent_highlights(&state.highlights, DEFAULT_RECENT_HIGHLIGHTS) {
        println!(
            "recent highlight id={} book_id={} page={} created_at={}",
            highlight.id,
            highlight.book_id,
            highlight.page,
            highlight.created_at.to_rfc3339()
        );
    }

    if let Some(user_id) = std::env::args().nth(1) {
        let conn = open_db(&config.db_path)?;
        let repo = SqliteUserSettingsRepository::new(&conn);
        match GoalProgress::for_user(&stats, &repo, &user_id)? {
            Some(goals) => println!(
                "goals user={} monthly={}/{} met={} yearly={}/{} met={}",
                user_id,
                goals.monthly_completed,
                goals.monthly_goal,
                goals.monthly_met(),
                goals.yearly_completed,
                goals.yearly_goal,
                goals.yearly_met()
            ),
            None => println!("goals user={user_id} not_set"),
        }
    }
    Ok(())
}
