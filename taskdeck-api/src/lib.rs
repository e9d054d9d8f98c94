//! # TaskDeck API Server Library
//!
//! Core functionality for the TaskDeck API server: a multi-tenant task
//! management backend with organizations, projects, tasks, and comments.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
