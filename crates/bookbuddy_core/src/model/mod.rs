//! Reading domain model shared by store, services and the UI bridge.
//!
//! # Responsibility
//! - Define canonical `Book` / `Highlight` records and their wire shape.
//! - Define onboarding preference payloads collected on first run.
//!
//! # Invariants
//! - Every book and highlight is identified by a stable UUID.
//! - Wire field names are camelCase so persisted snapshots stay readable by
//!   existing web clients.

pub mod book;
pub mod highlight;
pub mod onboarding;
