//! First-run onboarding flow.
//!
//! # Responsibility
//! - Provide a generic step controller over any closed step sequence.
//! - Bind it to the BookBuddy step sequence, validation rules and
//!   submission to the settings backend.
//!
//! # Invariants
//! - Forward moves never skip more than one step.
//! - Leaving a step forward requires its rule (if any) to pass.

pub mod controller;
pub mod rules;
pub mod session;
