//! Integration tests for OrderDesk.
//!
//! # Running Tests
//!
//! ```bash
//! # Point at a scratch database (migrations are applied automatically)
//! export ORDERDESK_TEST_DATABASE_URL=postgres://localhost/orderdesk_test
//!
//! # Database tests
//! cargo test -p orderdesk-integration-tests -- --ignored
//!
//! # HTTP tests additionally need a running server
//! export ORDERDESK_API_BASE_URL=http://localhost:8080
//! ```
//!
//! Every test creates its own users and products with unique names, so tests
//! can run in parallel against one database and never depend on seed data.

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use rust_decimal::Decimal;
use secrecy::SecretString;
use sqlx::PgPool;
use uuid::Uuid;

use orderdesk_api::db::{self, ProductRepository, UnknownProductPolicy, UserRepository};
use orderdesk_api::models::{AddressFields, NewOrderItem, Product, User};
use orderdesk_api::services::{
    AddressEventBus, AddressService, OrderAddressCoordinator, OrderService, RoleService,
    UserService,
};
use orderdesk_core::{OrderStatus, ProductId};

/// Environment variable naming the test database.
pub const TEST_DATABASE_URL: &str = "ORDERDESK_TEST_DATABASE_URL";

/// Shared handles for one test.
pub struct TestContext {
    pub pool: PgPool,
}

impl TestContext {
    /// Connect to the test database and bring its schema up to date.
    pub async fn new() -> Self {
        let url = std::env::var(TEST_DATABASE_URL)
            .unwrap_or_else(|_| panic!("{TEST_DATABASE_URL} must be set for integration tests"));
        let pool = db::create_pool(&SecretString::from(url))
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!("../api/migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        Self { pool }
    }

    /// Address service wired to the order coordinator, as the server does it.
    #[must_use]
    pub fn address_service(&self) -> AddressService {
        let coordinator = OrderAddressCoordinator::new(self.pool.clone());
        let events = AddressEventBus::new().with_listener(Arc::new(coordinator));
        AddressService::new(self.pool.clone(), events)
    }

    #[must_use]
    pub fn order_service(&self) -> OrderService {
        self.order_service_with(UnknownProductPolicy::Reject)
    }

    #[must_use]
    pub fn order_service_with(&self, policy: UnknownProductPolicy) -> OrderService {
        OrderService::new(self.pool.clone(), policy)
    }

    #[must_use]
    pub fn coordinator(&self) -> OrderAddressCoordinator {
        OrderAddressCoordinator::new(self.pool.clone())
    }

    #[must_use]
    pub fn user_service(&self) -> UserService {
        UserService::new(self.pool.clone())
    }

    #[must_use]
    pub fn role_service(&self) -> RoleService {
        RoleService::new(self.pool.clone())
    }

    /// A unique email address for a test user.
    #[must_use]
    pub fn unique_email() -> String {
        format!("it-{}@example.test", Uuid::new_v4())
    }

    /// Create a user with a unique email.
    pub async fn create_user(&self) -> User {
        UserRepository::new(&self.pool)
            .create(&Self::unique_email())
            .await
            .expect("Failed to create test user")
    }

    /// Create an active product with a unique name at `price`.
    pub async fn create_product(&self, price: Decimal) -> Product {
        ProductRepository::new(&self.pool)
            .create(&format!("it-product-{}", Uuid::new_v4()), "active", price)
            .await
            .expect("Failed to create test product")
    }

    /// A product ID guaranteed not to exist.
    pub async fn missing_product_id(&self) -> ProductId {
        let max: Option<i32> = sqlx::query_scalar("SELECT MAX(id) FROM products")
            .fetch_one(&self.pool)
            .await
            .expect("Failed to read max product id");
        ProductId::new(max.unwrap_or(0) + 1_000_000)
    }

    /// Current stored status of an order.
    pub async fn order_status(&self, id: orderdesk_core::OrderId) -> OrderStatus {
        let raw: String = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .expect("Order should exist");
        raw.parse().expect("Stored status should be valid")
    }

    /// Number of orders and order items belonging to a user.
    pub async fn order_row_counts(&self, user: &User) -> (i64, i64) {
        let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user.id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count orders");
        let items: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.user_id = $1
            ",
        )
        .bind(user.id)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to count order items");
        (orders, items)
    }

    /// Number of default addresses a user has.
    pub async fn default_address_count(&self, user: &User) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM addresses WHERE user_id = $1 AND is_default")
            .bind(user.id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count default addresses")
    }
}

/// Complete address fields with a distinguishing street line.
#[must_use]
pub fn address_fields(street: &str, is_default: bool) -> AddressFields {
    AddressFields {
        street_line1: street.to_owned(),
        street_line2: String::new(),
        city: "Springfield".to_owned(),
        state: "IL".to_owned(),
        postal_code: "62701".to_owned(),
        country: "USA".to_owned(),
        is_default,
    }
}

/// One order line.
#[must_use]
pub const fn line(product_id: ProductId, quantity: i32) -> NewOrderItem {
    NewOrderItem {
        product_id,
        quantity,
    }
}

/// Money from cents.
#[must_use]
pub fn cents(amount: i64) -> Decimal {
    Decimal::new(amount, 2)
}
