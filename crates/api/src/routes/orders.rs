//! Order route handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use orderdesk_core::{AddressId, OrderId, OrderStatus, UserId};

use super::{IdParam, ListParams, UserIdParam};
use crate::error::Result;
use crate::models::{CreatedOrder, NewOrderItem, Order};
use crate::state::AppState;

/// Body of `POST /orders/place`.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub user_id: UserId,
    pub items: Vec<NewOrderItem>,
    /// Zero or absent means no address yet.
    #[serde(default)]
    pub address_id: Option<AddressId>,
}

/// Body of `POST /orders/update-status`.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub id: OrderId,
    pub status: String,
}

/// Body of `POST /orders/batch-update-status`.
#[derive(Debug, Deserialize)]
pub struct BatchUpdateStatusRequest {
    pub ids: Vec<OrderId>,
    pub status: String,
}

/// Body of `POST /orders/delete`.
#[derive(Debug, Deserialize)]
pub struct DeleteOrderRequest {
    pub id: OrderId,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub id: OrderId,
    pub status: OrderStatus,
}

#[derive(Debug, Serialize)]
pub struct BatchUpdateResponse {
    pub updated: u64,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

/// List orders, newest first.
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Order>>> {
    let limit = params.effective(state.config().list_limit);
    Ok(Json(state.orders().list(limit).await?))
}

/// Show one order with items and address.
pub async fn show(
    State(state): State<AppState>,
    Query(IdParam { id }): Query<IdParam<OrderId>>,
) -> Result<Json<Order>> {
    Ok(Json(state.orders().get(id).await?))
}

/// List a user's pending orders.
pub async fn pending(
    State(state): State<AppState>,
    Query(UserIdParam { user_id }): Query<UserIdParam>,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.orders().list_pending_by_user(user_id).await?))
}

/// Place an order.
#[instrument(skip(state, request), fields(user_id = %request.user_id))]
pub async fn place(
    State(state): State<AppState>,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<CreatedOrder>)> {
    let created = state
        .orders()
        .place(request.user_id, &request.items, request.address_id)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Change one order's status.
#[instrument(skip(state))]
pub async fn update_status(
    State(state): State<AppState>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<StatusResponse>> {
    let status = state
        .orders()
        .update_status(request.id, &request.status)
        .await?;
    Ok(Json(StatusResponse {
        id: request.id,
        status,
    }))
}

/// Change the status of many orders at once.
#[instrument(skip(state, request), fields(requested = request.ids.len()))]
pub async fn batch_update_status(
    State(state): State<AppState>,
    Json(request): Json<BatchUpdateStatusRequest>,
) -> Result<Json<BatchUpdateResponse>> {
    let updated = state
        .orders()
        .batch_update_status(&request.ids, &request.status)
        .await?;
    Ok(Json(BatchUpdateResponse { updated }))
}

/// Delete an order and its items.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Json(request): Json<DeleteOrderRequest>,
) -> Result<Json<DeletedResponse>> {
    let deleted = state.orders().delete(request.id).await?;
    Ok(Json(DeletedResponse { deleted }))
}
