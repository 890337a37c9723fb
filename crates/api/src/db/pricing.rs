//! Price resolution at order-creation time.
//!
//! The catalog lookup answers `(price, exists)` for a product ID, modelled as
//! `Option<Decimal>`. What happens to a product that does not exist is a
//! policy decision made once, in configuration.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgConnection;

use orderdesk_core::ProductId;

use super::RepositoryError;

/// How order creation treats a product ID that is not in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownProductPolicy {
    /// Fail the order with `RepositoryError::UnknownProduct`.
    #[default]
    Reject,
    /// Price the line at zero and keep going (legacy catalog behavior).
    ZeroPrice,
}

impl UnknownProductPolicy {
    /// Turn a catalog lookup into the unit price to snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::UnknownProduct` when the product is missing
    /// and the policy is `Reject`.
    pub fn unit_price(
        self,
        product_id: ProductId,
        catalog_price: Option<Decimal>,
    ) -> Result<Decimal, RepositoryError> {
        match (catalog_price, self) {
            (Some(price), _) => Ok(price),
            (None, Self::ZeroPrice) => Ok(Decimal::ZERO),
            (None, Self::Reject) => Err(RepositoryError::UnknownProduct(product_id)),
        }
    }
}

impl FromStr for UnknownProductPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "zero" | "zero_price" => Ok(Self::ZeroPrice),
            other => Err(format!("unknown product policy: {other} (expected reject or zero)")),
        }
    }
}

/// Look up the current catalog price of a product.
///
/// Runs on the caller's connection so the lookup shares the order-creation
/// transaction. Returns `None` when the product does not exist.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn current_price(
    conn: &mut PgConnection,
    product_id: ProductId,
) -> Result<Option<Decimal>, RepositoryError> {
    let price = sqlx::query_scalar::<_, Decimal>("SELECT price FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(price)
}

/// Resolve the unit price for one order line under `policy`.
///
/// # Errors
///
/// Returns `RepositoryError::UnknownProduct` for a missing product under
/// `UnknownProductPolicy::Reject`, or `RepositoryError::Database`.
pub async fn resolve_unit_price(
    conn: &mut PgConnection,
    product_id: ProductId,
    policy: UnknownProductPolicy,
) -> Result<Decimal, RepositoryError> {
    let catalog_price = current_price(conn, product_id).await?;
    policy.unit_price(product_id, catalog_price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_product_uses_catalog_price() {
        for policy in [UnknownProductPolicy::Reject, UnknownProductPolicy::ZeroPrice] {
            let price = policy.unit_price(ProductId::new(1), Some(Decimal::new(4999, 2)));
            assert!(matches!(price, Ok(p) if p == Decimal::new(4999, 2)));
        }
    }

    #[test]
    fn test_reject_policy_fails_unknown_product() {
        let result = UnknownProductPolicy::Reject.unit_price(ProductId::new(99), None);
        assert!(matches!(
            result,
            Err(RepositoryError::UnknownProduct(id)) if id == ProductId::new(99)
        ));
    }

    #[test]
    fn test_zero_policy_prices_unknown_product_at_zero() {
        let result = UnknownProductPolicy::ZeroPrice.unit_price(ProductId::new(99), None);
        assert!(matches!(result, Ok(p) if p == Decimal::ZERO));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "reject".parse::<UnknownProductPolicy>(),
            Ok(UnknownProductPolicy::Reject)
        );
        assert_eq!(
            " ZERO ".parse::<UnknownProductPolicy>(),
            Ok(UnknownProductPolicy::ZeroPrice)
        );
        assert_eq!(
            "zero_price".parse::<UnknownProductPolicy>(),
            Ok(UnknownProductPolicy::ZeroPrice)
        );
        assert!("lenient".parse::<UnknownProductPolicy>().is_err());
    }

    #[test]
    fn test_default_policy_rejects() {
        assert_eq!(UnknownProductPolicy::default(), UnknownProductPolicy::Reject);
    }
}
