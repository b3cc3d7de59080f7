//! Trident API Library
//!
//! This crate provides the HTTP handlers and application setup.

pub mod constants;
pub mod handlers;
pub mod setup;
pub mod state;

pub use state::AppState;
