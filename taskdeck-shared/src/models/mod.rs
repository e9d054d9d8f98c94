/// Database models
///
/// Each model owns its table's queries. Tenant-owned resources (projects,
/// tasks, comments) are only reachable through `(id, org_id)` lookups that
/// filter soft-deleted rows; there are no unscoped finders for them.

pub mod comment;
pub mod organization;
pub mod project;
pub mod refresh_token;
pub mod task;
pub mod user;
