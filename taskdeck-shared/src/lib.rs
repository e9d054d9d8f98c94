//! # TaskDeck Shared Library
//!
//! This crate contains shared types, utilities, and business logic used by
//! the TaskDeck API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `auth`: Authentication and authorization utilities
//! - `email`: Outbound email notifier
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod email;
pub mod models;

/// Current version of the TaskDeck shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
