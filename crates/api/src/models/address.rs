//! Shipping address domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderdesk_core::{AddressId, UserId};

/// A user's shipping address.
///
/// A user has at most one address with `is_default` set. Orders reference
/// addresses without owning them, and an address cannot be deleted while any
/// order still points at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub street_line1: String,
    /// Apartment, suite, etc. Empty when unused.
    pub street_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied address fields for create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressFields {
    pub street_line1: String,
    #[serde(default)]
    pub street_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub is_default: bool,
}

impl AddressFields {
    /// Name of the first required field that is blank, if any.
    #[must_use]
    pub fn first_missing(&self) -> Option<&'static str> {
        [
            ("street_line1", &self.street_line1),
            ("city", &self.city),
            ("state", &self.state),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}
