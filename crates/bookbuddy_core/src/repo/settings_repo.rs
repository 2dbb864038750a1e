//! SQLite-backed user settings.
//!
//! # Invariants
//! - One row per user id; writes are full replacements (upsert).
//! - `genres_json` / `schedule_json` hold JSON arrays.

use crate::model::onboarding::{ScheduleSlot, UserSettings};
use crate::ports::{PortError, PortResult, UserSettingsPort};
use log::error;
use rusqlite::{params, Connection, OptionalExtension, Row};

/// `UserSettingsPort` over the `user_settings` table.
pub struct SqliteUserSettingsRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserSettingsRepository<'conn> {
    /// Wraps a migrated connection (see [`crate::db::open_db`]).
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserSettingsPort for SqliteUserSettingsRepository<'_> {
    fn get_settings(&self, user_id: &str) -> PortResult<Option<UserSettings>> {
        let row = self
            .conn
            .query_row(
                "SELECT
                    genres_json,
                    monthly_goal,
                    yearly_goal,
                    schedule_json,
                    onboarding_completed
                 FROM user_settings
                 WHERE user_id = ?1;",
                [user_id],
                read_raw_row,
            )
            .optional()
            .map_err(db_error)?;

        row.map(parse_settings).transpose()
    }

    fn update_settings(&self, user_id: &str, settings: &UserSettings) -> PortResult<()> {
        let genres_json = serde_json::to_string(&settings.genres)
            .map_err(|err| PortError::Backend(format!("encode genres: {err}")))?;
        let schedule_json = serde_json::to_string(&settings.schedule)
            .map_err(|err| PortError::Backend(format!("encode schedule: {err}")))?;

        self.conn
            .execute(
                "INSERT INTO user_settings (
                    user_id,
                    genres_json,
                    monthly_goal,
                    yearly_goal,
                    schedule_json,
                    onboarding_completed
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(user_id) DO UPDATE SET
                    genres_json = excluded.genres_json,
                    monthly_goal = excluded.monthly_goal,
                    yearly_goal = excluded.yearly_goal,
                    schedule_json = excluded.schedule_json,
                    onboarding_completed = excluded.onboarding_completed,
                    updated_at = (strftime('%s', 'now') * 1000);",
                params![
                    user_id,
                    genres_json,
                    settings.monthly_goal,
                    settings.yearly_goal,
                    schedule_json,
                    settings.onboarding_completed,
                ],
            )
            .map_err(db_error)?;
        Ok(())
    }
}

struct RawSettingsRow {
    genres_json: String,
    monthly_goal: u32,
    yearly_goal: u32,
    schedule_json: String,
    onboarding_completed: bool,
}

fn read_raw_row(row: &Row<'_>) -> rusqlite::Result<RawSettingsRow> {
    Ok(RawSettingsRow {
        genres_json: row.get("genres_json")?,
        monthly_goal: row.get("monthly_goal")?,
        yearly_goal: row.get("yearly_goal")?,
        schedule_json: row.get("schedule_json")?,
        onboarding_completed: row.get("onboarding_completed")?,
    })
}

fn parse_settings(raw: RawSettingsRow) -> PortResult<UserSettings> {
    let genres: Vec<String> = serde_json::from_str(&raw.genres_json).map_err(|err| {
        PortError::Backend(format!("invalid genres_json in user_settings: {err}"))
    })?;
    let schedule: Vec<ScheduleSlot> = serde_json::from_str(&raw.schedule_json).map_err(|err| {
        PortError::Backend(format!("invalid schedule_json in user_settings: {err}"))
    })?;
    Ok(UserSettings {
        genres,
        monthly_goal: raw.monthly_goal,
        yearly_goal: raw.yearly_goal,
        schedule,
        onboarding_completed: raw.onboarding_completed,
    })
}

fn db_error(err: rusqlite::Error) -> PortError {
    error!("event=settings_query module=repo status=error error={err}");
    PortError::Backend(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::SqliteUserSettingsRepository;
    use crate::db::open_db_in_memory;
    use crate::model::onboarding::UserSettings;
    use crate::ports::{PortError, UserSettingsPort};

    #[test]
    fn corrupt_genres_column_is_reported() {
        let conn = open_db_in_memory().unwrap();
        conn.execute(
            "INSERT INTO user_settings (user_id, genres_json) VALUES ('u1', 'not json');",
            [],
        )
        .unwrap();
        let repo = SqliteUserSettingsRepository::new(&conn);
        let err = repo.get_settings("u1").unwrap_err();
        assert!(matches!(err, PortError::Backend(message) if message.contains("genres_json")));
    }

    #[test]
    fn update_replaces_existing_row() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteUserSettingsRepository::new(&conn);
        let mut settings = UserSettings {
            genres: vec!["fantasy".to_string()],
            monthly_goal: 2,
            yearly_goal: 24,
            ..UserSettings::default()
        };
        repo.update_settings("u1", &settings).unwrap();
        settings.monthly_goal = 3;
        repo.update_settings("u1", &settings).unwrap();
        assert_eq!(repo.get_settings("u1").unwrap(), Some(settings));
    }
}
