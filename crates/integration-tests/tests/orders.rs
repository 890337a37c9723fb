//! Integration tests for order placement and status changes.
//!
//! These tests require a `PostgreSQL` database reachable through
//! `ORDERDESK_TEST_DATABASE_URL`.
//!
//! Run with: cargo test -p orderdesk-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used)]

use orderdesk_api::db::{OrderRepository, ProductRepository, RepositoryError, UnknownProductPolicy};
use orderdesk_api::services::ServiceError;
use orderdesk_core::{AddressId, MAX_LINE_QUANTITY, OrderId, OrderStatus};
use orderdesk_integration_tests::{TestContext, cents, line};

// ============================================================================
// Placement and Totals
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_total_is_sum_of_snapshotted_lines() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let p = ctx.create_product(cents(1000)).await;
    let q = ctx.create_product(cents(500)).await;
    let orders = ctx.order_service();

    let created = orders
        .place(user.id, &[line(p.id, 3), line(q.id, 1)], None)
        .await
        .unwrap();
    assert_eq!(created.total_amount, cents(3500));

    // Catalog price changes never touch placed orders.
    let changed = ProductRepository::new(&ctx.pool)
        .update_price(p.id, cents(9999))
        .await
        .unwrap();
    assert!(changed);

    let order = orders.get(created.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, cents(3500));
    assert_eq!(order.address_id, None);
    assert_eq!(order.items.len(), 2);

    let p_line = order.items.iter().find(|i| i.product_id == p.id).unwrap();
    assert_eq!(p_line.price, cents(1000));
    assert_eq!(p_line.quantity, 3);
    assert_eq!(
        p_line.product.as_ref().map(|s| s.name.as_str()),
        Some(p.name.as_str())
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_invalid_item_leaves_no_rows() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let p = ctx.create_product(cents(1000)).await;

    // Bypass service validation so the storage constraint fails mid-transaction.
    let result = OrderRepository::new(&ctx.pool)
        .create(
            user.id,
            &[line(p.id, 2), line(p.id, 0)],
            None,
            UnknownProductPolicy::Reject,
        )
        .await;

    assert!(matches!(result, Err(RepositoryError::Database(_))));
    assert_eq!(ctx.order_row_counts(&user).await, (0, 0));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_unknown_product_is_rejected_by_default() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let p = ctx.create_product(cents(1000)).await;
    let missing = ctx.missing_product_id().await;

    let err = ctx
        .order_service()
        .place(user.id, &[line(p.id, 1), line(missing, 1)], None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Repository(RepositoryError::UnknownProduct(id)) if id == missing
    ));
    assert_eq!(ctx.order_row_counts(&user).await, (0, 0));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_unknown_product_prices_at_zero_when_configured() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let p = ctx.create_product(cents(250)).await;
    let missing = ctx.missing_product_id().await;

    let created = ctx
        .order_service_with(UnknownProductPolicy::ZeroPrice)
        .place(user.id, &[line(p.id, 2), line(missing, 4)], None)
        .await
        .unwrap();

    assert_eq!(created.total_amount, cents(500));
    let order = ctx.order_service().get(created.id).await.unwrap();
    let ghost = order.items.iter().find(|i| i.product_id == missing).unwrap();
    assert_eq!(ghost.price, cents(0));
    assert!(ghost.product.is_none());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_missing_address_rejects_placement() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let p = ctx.create_product(cents(100)).await;

    let err = ctx
        .order_service()
        .place(user.id, &[line(p.id, 1)], Some(AddressId::new(i32::MAX)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Repository(RepositoryError::NotFound("address"))
    ));
    assert_eq!(ctx.order_row_counts(&user).await, (0, 0));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_huge_quantity_is_rejected_before_storage() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let p = ctx.create_product(cents(1000)).await;

    let err = ctx
        .order_service()
        .place(user.id, &[line(p.id, i32::MAX)], None)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(ctx.order_row_counts(&user).await, (0, 0));

    // The largest accepted quantity still stores.
    let created = ctx
        .order_service()
        .place(user.id, &[line(p.id, MAX_LINE_QUANTITY)], None)
        .await
        .unwrap();
    assert_eq!(created.total_amount, cents(1_000_000_000));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_total_beyond_storage_range_leaves_no_rows() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let pricey = ctx.create_product(cents(500_000_000_000)).await;

    let err = ctx
        .order_service()
        .place(user.id, &[line(pricey.id, 2)], None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Repository(RepositoryError::AmountOutOfRange(total))
            if total == cents(1_000_000_000_000)
    ));
    assert_eq!(ctx.order_row_counts(&user).await, (0, 0));
}

// ============================================================================
// Status Changes
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_batch_update_changes_every_listed_order() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let p = ctx.create_product(cents(100)).await;
    let orders = ctx.order_service();

    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(orders.place(user.id, &[line(p.id, 1)], None).await.unwrap().id);
    }

    let updated = orders.batch_update_status(&ids, "completed").await.unwrap();

    assert_eq!(updated, 3);
    for id in ids {
        assert_eq!(ctx.order_status(id).await, OrderStatus::Completed);
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_batch_update_skips_missing_ids() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let p = ctx.create_product(cents(100)).await;
    let orders = ctx.order_service();

    let real = orders.place(user.id, &[line(p.id, 1)], None).await.unwrap().id;

    let updated = orders
        .batch_update_status(&[real, OrderId::new(i32::MAX), real], "cancelled")
        .await
        .unwrap();

    assert_eq!(updated, 1);
    assert_eq!(ctx.order_status(real).await, OrderStatus::Cancelled);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_update_status_of_missing_order_is_not_found() {
    let ctx = TestContext::new().await;

    let err = ctx
        .order_service()
        .update_status(OrderId::new(i32::MAX), "processing")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Repository(RepositoryError::NotFound("order"))
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_pending_list_is_oldest_first_and_excludes_other_statuses() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let p = ctx.create_product(cents(100)).await;
    let orders = ctx.order_service();

    let first = orders.place(user.id, &[line(p.id, 1)], None).await.unwrap().id;
    let second = orders.place(user.id, &[line(p.id, 2)], None).await.unwrap().id;
    let done = orders.place(user.id, &[line(p.id, 3)], None).await.unwrap().id;
    orders.update_status(done, "completed").await.unwrap();

    let pending: Vec<OrderId> = orders
        .list_pending_by_user(user.id)
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.id)
        .collect();

    assert_eq!(pending, vec![first, second]);
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (ORDERDESK_TEST_DATABASE_URL)"]
async fn test_delete_removes_order_and_items() {
    let ctx = TestContext::new().await;
    let user = ctx.create_user().await;
    let p = ctx.create_product(cents(100)).await;
    let q = ctx.create_product(cents(200)).await;
    let orders = ctx.order_service();

    let id = orders
        .place(user.id, &[line(p.id, 1), line(q.id, 1)], None)
        .await
        .unwrap()
        .id;
    assert_eq!(ctx.order_row_counts(&user).await, (1, 2));

    assert!(orders.delete(id).await.unwrap());
    assert_eq!(ctx.order_row_counts(&user).await, (0, 0));

    // A second delete finds nothing.
    assert!(!orders.delete(id).await.unwrap());
}
