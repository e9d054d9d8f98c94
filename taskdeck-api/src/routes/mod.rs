/// API route handlers
///
/// # Modules
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, token lifecycle, verification and reset
/// - `oauth`: OAuth authorize/callback legs (Google, GitHub)
/// - `organizations`: Organization lifecycle and membership
/// - `users`: Member administration within an organization
/// - `projects`: Project CRUD and progress
/// - `tasks`: Task CRUD
/// - `comments`: Comments on tasks

pub mod auth;
pub mod comments;
pub mod health;
pub mod oauth;
pub mod organizations;
pub mod projects;
pub mod tasks;
pub mod users;
