//! FFI bridge crate exposing BookBuddy core use-cases to Flutter.

pub mod api;
