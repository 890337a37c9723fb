//! Role domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use orderdesk_core::RoleId;

/// A named role. Roles are managed here but not yet attached to users.
#[derive(Debug, Clone, Serialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
