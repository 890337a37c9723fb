//! Integration tests for address writes.
//!
//! These tests require a `PostgreSQL` database reachable through
//! `ORDERDESK_TEST_DATABASE_URL`.
//!
//! Run with: cargo test -p orderdesk-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use orderdesk_api::db::{AddressRepository, RepositoryError};
use orderdesk_api::services::ServiceError;
use orderdesk_core::{AddressId, OrderId, UserId};
use orderdesk_integration_tests::{TestContext, address_fields, cents, line};

// ============================================================================
// Default Address Invariant
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_new_default_replaces_previous_default() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let service = ctx.address_service();

    let first = service
        .create(user.id, &address_fields("1 First St", true))
        .await
        .unwrap();
    let second = service
        .create(user.id, &address_fields("2 Second St", true))
        .await
        .unwrap();

    assert!(service.get(second.address.id).await.unwrap().is_default);
    assert!(!service.get(first.address.id).await.unwrap().is_default);
    assert_eq!(ctx.default_address_count(&user).await, 1);

    // Default first, then by ID.
    let listed = service.list_by_user(user.id).await.unwrap();
    assert_eq!(listed.first().map(|a| a.id), Some(second.address.id));
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_non_default_create_keeps_existing_default() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let service = ctx.address_service();

    let default = service
        .create(user.id, &address_fields("1 Default Rd", true))
        .await
        .unwrap();
    service
        .create(user.id, &address_fields("2 Other Rd", false))
        .await
        .unwrap();

    assert!(service.get(default.address.id).await.unwrap().is_default);
    assert_eq!(ctx.default_address_count(&user).await, 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_update_to_default_clears_others() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let service = ctx.address_service();

    let first = service
        .create(user.id, &address_fields("1 Elm St", true))
        .await
        .unwrap();
    let second = service
        .create(user.id, &address_fields("2 Elm St", false))
        .await
        .unwrap();

    let updated = service
        .update(second.address.id, user.id, &address_fields("2B Elm St", true))
        .await
        .unwrap();

    assert!(updated.address.is_default);
    assert_eq!(updated.address.street_line1, "2B Elm St");
    assert!(!service.get(first.address.id).await.unwrap().is_default);
    assert_eq!(ctx.default_address_count(&user).await, 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_concurrent_default_creates_leave_one_default() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let service = ctx.address_service();

    let writes = (0..8).map(|i| {
        let service = service.clone();
        let user_id = user.id;
        tokio::spawn(async move {
            service
                .create(user_id, &address_fields(&format!("{i} Race Ln"), true))
                .await
        })
    });

    for handle in writes.collect::<Vec<_>>() {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(ctx.default_address_count(&user).await, 1);
}

// ============================================================================
// Not Found and Validation
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_update_of_other_users_address_is_not_found() {
    let ctx = TestContext::new().await;
    let owner = ctx.create_user().await;
    let stranger = ctx.create_user().await;
    let service = ctx.address_service();

    let address = service
        .create(owner.id, &address_fields("1 Owner Way", true))
        .await
        .unwrap();

    let err = service
        .update(address.address.id, stranger.id, &address_fields("Hijacked", true))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Repository(RepositoryError::NotFound("address"))
    ));
    let unchanged = service.get(address.address.id).await.unwrap();
    assert_eq!(unchanged.street_line1, "1 Owner Way");
    assert!(unchanged.is_default);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_create_for_missing_user_is_not_found() {
    let ctx = TestContext::new().await;
    let err = AddressRepository::new(&ctx.pool)
        .create(UserId::new(i32::MAX), &address_fields("Nowhere", false))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound("user")));
}

// ============================================================================
// Delete Guard
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_delete_referenced_address_is_refused() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let product = ctx.create_product(cents(1000)).await;
    let service = ctx.address_service();

    let address = service
        .create(user.id, &address_fields("1 Kept Ct", true))
        .await
        .unwrap();
    ctx.order_service()
        .place(user.id, &[line(product.id, 1)], Some(address.address.id))
        .await
        .unwrap();

    let err = service.delete(address.address.id, user.id).await.unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Repository(RepositoryError::AddressInUse)
    ));
    assert!(service.get(address.address.id).await.is_ok());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_delete_unreferenced_address_removes_it() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let service = ctx.address_service();

    let address = service
        .create(user.id, &address_fields("1 Gone Blvd", false))
        .await
        .unwrap();

    service.delete(address.address.id, user.id).await.unwrap();

    let err = service.get(address.address.id).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Repository(RepositoryError::NotFound("address"))
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_delete_missing_address_is_not_found() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;

    let err = ctx
        .address_service()
        .delete(AddressId::new(i32::MAX), user.id)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Repository(RepositoryError::NotFound("address"))
    ));
}

// ============================================================================
// Concurrent Checkout
// ============================================================================

/// Long enough for a spawned writer to reach its first blocking lock.
const SETTLE: Duration = Duration::from_millis(200);

/// Upper bound on any single write in these tests; a lock cycle would hang.
const WRITE_DEADLINE: Duration = Duration::from_secs(10);

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_default_change_does_not_block_order_on_old_default() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let service = ctx.address_service();
    let old_default = service
        .create(user.id, &address_fields("1 Old Default St", true))
        .await
        .unwrap();

    // Order placement holds a share lock on its address before inserting the order.
    let mut placing = ctx.pool.begin().await.unwrap();
    sqlx::query("SELECT id FROM addresses WHERE id = $1 FOR SHARE")
        .bind(old_default.address.id)
        .execute(&mut *placing)
        .await
        .unwrap();

    // The new default must clear the old one, so it waits on that share lock
    // while holding the user lock.
    let replacing = tokio::spawn({
        let service = service.clone();
        let user_id = user.id;
        async move {
            service
                .create(user_id, &address_fields("2 New Default St", true))
                .await
        }
    });
    tokio::time::sleep(SETTLE).await;

    // The order insert checks the user foreign key while the user lock is held.
    let order_id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO orders (user_id, address_id, total_amount, status)
        VALUES ($1, $2, 0, 'pending')
        RETURNING id
        ",
    )
    .bind(user.id)
    .bind(old_default.address.id)
    .fetch_one(&mut *placing)
    .await
    .unwrap();
    placing.commit().await.unwrap();

    let replaced = tokio::time::timeout(WRITE_DEADLINE, replacing)
        .await
        .expect("default change should finish once the order commits")
        .unwrap()
        .unwrap();

    assert!(replaced.address.is_default);
    assert!(!service.get(old_default.address.id).await.unwrap().is_default);
    assert_eq!(ctx.default_address_count(&user).await, 1);
    let order = ctx.order_service().get(OrderId::new(order_id)).await.unwrap();
    assert_eq!(order.address_id, Some(old_default.address.id));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_orders_on_default_and_default_changes_both_succeed() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let product_id = ctx.create_product(cents(1000)).await.id;
    let addresses = ctx.address_service();
    let orders = ctx.order_service();

    let mut current = addresses
        .create(user.id, &address_fields("0 Start St", true))
        .await
        .unwrap()
        .address
        .id;

    for round in 1..=5 {
        let placing = {
            let orders = orders.clone();
            let user_id = user.id;
            tokio::spawn(async move {
                orders
                    .place(user_id, &[line(product_id, 1)], Some(current))
                    .await
            })
        };
        let replacing = {
            let addresses = addresses.clone();
            let user_id = user.id;
            tokio::spawn(async move {
                addresses
                    .create(user_id, &address_fields(&format!("{round} Swap St"), true))
                    .await
            })
        };

        let (placed, replaced) = tokio::join!(
            tokio::time::timeout(WRITE_DEADLINE, placing),
            tokio::time::timeout(WRITE_DEADLINE, replacing),
        );
        let placed = placed.expect("placement should not hang").unwrap().unwrap();
        let replaced = replaced.expect("default change should not hang").unwrap().unwrap();

        let order = orders.get(placed.id).await.unwrap();
        assert_eq!(order.address_id, Some(current));
        current = replaced.address.id;
    }

    assert_eq!(ctx.default_address_count(&user).await, 1);
    assert!(addresses.get(current).await.unwrap().is_default);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_delete_waits_for_in_flight_bind_and_refuses() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let product = ctx.create_product(cents(100)).await;
    let service = ctx.address_service();

    let order = ctx
        .order_service()
        .place(user.id, &[line(product.id, 1)], None)
        .await
        .unwrap()
        .id;
    let address = service
        .create(user.id, &address_fields("1 Contested Ct", false))
        .await
        .unwrap()
        .address
        .id;

    // An assignment in flight: the order is locked and the address share-locked.
    let mut binding = ctx.pool.begin().await.unwrap();
    sqlx::query("SELECT id FROM orders WHERE id = $1 FOR UPDATE")
        .bind(order)
        .execute(&mut *binding)
        .await
        .unwrap();
    sqlx::query("SELECT id FROM addresses WHERE id = $1 FOR SHARE")
        .bind(address)
        .execute(&mut *binding)
        .await
        .unwrap();

    let deleting = tokio::spawn({
        let service = service.clone();
        let user_id = user.id;
        async move { service.delete(address, user_id).await }
    });
    tokio::time::sleep(SETTLE).await;
    assert!(!deleting.is_finished());

    sqlx::query("UPDATE orders SET address_id = $2, updated_at = NOW() WHERE id = $1")
        .bind(order)
        .bind(address)
        .execute(&mut *binding)
        .await
        .unwrap();
    binding.commit().await.unwrap();

    let err = tokio::time::timeout(WRITE_DEADLINE, deleting)
        .await
        .expect("delete should finish once the bind commits")
        .unwrap()
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Repository(RepositoryError::AddressInUse)
    ));
    assert!(service.get(address).await.is_ok());
    let stored = ctx.order_service().get(order).await.unwrap();
    assert_eq!(stored.address_id, Some(address));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_racing_delete_and_assign_never_dangle() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let product = ctx.create_product(cents(100)).await;
    let service = ctx.address_service();
    let coordinator = ctx.coordinator();

    for round in 0..5 {
        let order = ctx
            .order_service()
            .place(user.id, &[line(product.id, 1)], None)
            .await
            .unwrap()
            .id;
        let address = service
            .create(user.id, &address_fields(&format!("{round} Race Rd"), false))
            .await
            .unwrap()
            .address
            .id;

        let deleting = {
            let service = service.clone();
            let user_id = user.id;
            tokio::spawn(async move { service.delete(address, user_id).await })
        };
        let assigning = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.assign_address_to_order(order, address).await })
        };

        let (deleted, assigned) = tokio::join!(deleting, assigning);
        let (deleted, assigned) = (deleted.unwrap(), assigned.unwrap());

        match (&deleted, &assigned) {
            // Delete won: the assignment found no address.
            (Ok(()), Err(ServiceError::Repository(RepositoryError::NotFound("address")))) => {
                assert!(service.get(address).await.is_err());
                let stored = ctx.order_service().get(order).await.unwrap();
                assert_eq!(stored.address_id, None);
            }
            // Assign won: the address is referenced and kept.
            (Err(ServiceError::Repository(RepositoryError::AddressInUse)), Ok(assignment)) => {
                assert_eq!(assignment.address_id, address);
                assert!(service.get(address).await.is_ok());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    let dangling: i64 = sqlx::query_scalar(
        r"
        SELECT COUNT(*) FROM orders o
        LEFT JOIN addresses a ON a.id = o.address_id
        WHERE o.user_id = $1 AND o.address_id IS NOT NULL AND a.id IS NULL
        ",
    )
    .bind(user.id)
    .fetch_one(&ctx.pool)
    .await
    .unwrap();
    assert_eq!(dangling, 0);
}
