//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store mutations into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details and business rules.

pub mod library_service;
pub mod status_transition;
