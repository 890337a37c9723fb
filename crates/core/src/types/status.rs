//! Order lifecycle status.
//!
//! ```text
//! pending ──► processing ──► completed
//!    │
//!    └──────► cancelled
//! ```
//!
//! Only `pending → processing` happens automatically (when a shipping address
//! becomes available). Every other change is requested by a caller. The set of
//! values is closed: the column carries a `CHECK` constraint and parsing an
//! unknown string fails, so a typo can never mint a new unreachable state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string is not a known order status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseStatusError {
    /// The input was empty or whitespace.
    #[error("status is required")]
    Empty,
    /// The input is not one of the known statuses.
    #[error("invalid order status: {0} (expected pending, processing, completed or cancelled)")]
    Unknown(String),
}

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, waiting for a shipping address.
    #[default]
    Pending,
    /// Has somewhere to ship to; being worked on.
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Processing,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Status an order moves to once a shipping address is bound to it.
    ///
    /// Pending orders advance to processing; any other status is kept, which
    /// makes re-applying the rule a no-op.
    #[must_use]
    pub const fn with_address_bound(self) -> Self {
        match self {
            Self::Pending => Self::Processing,
            other => other,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseStatusError::Empty);
        }
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseStatusError::Unknown(trimmed.to_owned()))
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Type<::sqlx::Postgres> for OrderStatus {
    fn type_info() -> ::sqlx::postgres::PgTypeInfo {
        <&str as ::sqlx::Type<::sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
        <&str as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for OrderStatus {
    fn decode(
        value: ::sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, ::sqlx::error::BoxDynError> {
        let raw = <&str as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
        Ok(raw.parse()?)
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Encode<'_, ::sqlx::Postgres> for OrderStatus {
    fn encode_by_ref(
        &self,
        buf: &mut ::sqlx::postgres::PgArgumentBuffer,
    ) -> Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
        <&str as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}
