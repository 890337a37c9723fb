//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use orderdesk_core::UserId;

/// An account that owns addresses and orders.
///
/// Authentication data lives elsewhere; this service only needs identity.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
