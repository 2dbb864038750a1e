//! Local persistence implementations of core ports.
//!
//! # Responsibility
//! - Back `UserSettingsPort` with SQLite for offline-first clients.
//!
//! # Invariants
//! - Repository reads reject invalid persisted rows instead of masking them.

pub mod settings_repo;
