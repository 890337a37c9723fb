//! Seed the database with sample data.
//!
//! Every step checks before inserting, so running the command twice leaves
//! the same rows as running it once. Orders go through the order service and
//! therefore get catalog prices and computed totals.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;

use orderdesk_api::db::{
    AddressRepository, ProductRepository, RepositoryError, RoleRepository, UnknownProductPolicy,
    UserRepository,
};
use orderdesk_api::models::{AddressFields, NewOrderItem, User};
use orderdesk_api::services::{OrderService, ServiceError};
use orderdesk_core::{OrderStatus, ProductId};

const USERS: [&str; 3] = ["admin@example.com", "user1@example.com", "user2@example.com"];

/// Name, status, price in cents.
const PRODUCTS: [(&str, &str, i64); 3] = [
    ("Product 1", "active", 4999),
    ("Product 2", "inactive", 14995),
    ("Product 3", "active", 2999),
];

const ROLES: [(&str, &str); 3] = [
    ("Admin", "Full system access"),
    ("Editor", "Can edit content"),
    ("Viewer", "Read-only access"),
];

/// Seed sample data.
///
/// # Errors
///
/// Returns an error if any database operation fails.
pub async fn run(pool: &PgPool) -> Result<(), ServiceError> {
    let users = seed_users(pool).await?;
    let products = seed_products(pool).await?;
    seed_roles(pool).await?;
    seed_orders(pool, &users, &products).await?;
    seed_addresses(pool, &users).await?;

    info!("Seeding complete!");
    Ok(())
}

async fn seed_users(pool: &PgPool) -> Result<Vec<User>, RepositoryError> {
    let repo = UserRepository::new(pool);
    let mut users = Vec::with_capacity(USERS.len());

    for email in USERS {
        let user = match repo.get_by_email(email).await? {
            Some(user) => user,
            None => {
                let user = repo.create(email).await?;
                info!(user_id = %user.id, email, "Created user");
                user
            }
        };
        users.push(user);
    }

    Ok(users)
}

async fn seed_products(pool: &PgPool) -> Result<Vec<ProductId>, RepositoryError> {
    let repo = ProductRepository::new(pool);
    let mut ids = Vec::with_capacity(PRODUCTS.len());

    for (name, status, cents) in PRODUCTS {
        let product = match repo.get_by_name(name).await? {
            Some(product) => product,
            None => {
                let product = repo.create(name, status, Decimal::new(cents, 2)).await?;
                info!(product_id = %product.id, name, price = %product.price, "Created product");
                product
            }
        };
        ids.push(product.id);
    }

    Ok(ids)
}

async fn seed_roles(pool: &PgPool) -> Result<(), RepositoryError> {
    let repo = RoleRepository::new(pool);
    for (name, description) in ROLES {
        let role = repo.ensure(name, Some(description)).await?;
        info!(role_id = %role.id, name, "Role present");
    }
    Ok(())
}

/// One order per user without orders: user N buys product N, then the
/// first two orders are moved along to show the other statuses.
async fn seed_orders(
    pool: &PgPool,
    users: &[User],
    products: &[ProductId],
) -> Result<(), ServiceError> {
    let orders = OrderService::new(pool.clone(), UnknownProductPolicy::Reject);
    let quantities = [2, 1, 1];
    let final_status = [
        OrderStatus::Completed,
        OrderStatus::Processing,
        OrderStatus::Pending,
    ];

    for (((user, product_id), quantity), status) in users
        .iter()
        .zip(products)
        .zip(quantities)
        .zip(final_status)
    {
        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user.id)
            .fetch_one(pool)
            .await
            .map_err(RepositoryError::from)?;
        if existing > 0 {
            continue;
        }

        let items = [NewOrderItem {
            product_id: *product_id,
            quantity,
        }];
        let created = orders.place(user.id, &items, None).await?;
        if status != OrderStatus::Pending {
            orders.update_status(created.id, status.as_str()).await?;
        }
        info!(order_id = %created.id, user_id = %user.id, total = %created.total_amount, %status, "Created order");
    }

    Ok(())
}

/// Default addresses for the first two users, if they have none yet.
///
/// Written through the repository so that seeding does not advance the
/// sample orders.
async fn seed_addresses(pool: &PgPool, users: &[User]) -> Result<(), RepositoryError> {
    let repo = AddressRepository::new(pool);
    let samples = [
        AddressFields {
            street_line1: "123 Main St".to_owned(),
            street_line2: "Apt 4B".to_owned(),
            city: "New York".to_owned(),
            state: "NY".to_owned(),
            postal_code: "10001".to_owned(),
            country: "USA".to_owned(),
            is_default: true,
        },
        AddressFields {
            street_line1: "456 Oak Ave".to_owned(),
            street_line2: String::new(),
            city: "Los Angeles".to_owned(),
            state: "CA".to_owned(),
            postal_code: "90001".to_owned(),
            country: "USA".to_owned(),
            is_default: true,
        },
    ];

    for (user, fields) in users.iter().zip(&samples) {
        if !repo.list_by_user(user.id).await?.is_empty() {
            continue;
        }
        let address = repo.create(user.id, fields).await?;
        info!(address_id = %address.id, user_id = %user.id, "Created address");
    }

    Ok(())
}
