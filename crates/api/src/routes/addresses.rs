//! Address route handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use orderdesk_core::{AddressId, OrderId, UserId};

use super::{IdParam, ListParams, UserIdParam};
use crate::error::Result;
use crate::models::{Address, AddressAssignment, AddressFields};
use crate::services::SavedAddress;
use crate::state::AppState;

/// Body of `POST /addresses/create`.
#[derive(Debug, Deserialize)]
pub struct CreateAddressRequest {
    pub user_id: UserId,
    #[serde(flatten)]
    pub fields: AddressFields,
}

/// Body of `POST /addresses/update`.
#[derive(Debug, Deserialize)]
pub struct UpdateAddressRequest {
    pub id: AddressId,
    pub user_id: UserId,
    #[serde(flatten)]
    pub fields: AddressFields,
}

/// Body of `POST /addresses/delete`.
#[derive(Debug, Deserialize)]
pub struct DeleteAddressRequest {
    pub id: AddressId,
    pub user_id: UserId,
}

/// Body of `POST /addresses/assign-to-order`.
#[derive(Debug, Deserialize)]
pub struct AssignAddressRequest {
    pub order_id: OrderId,
    pub address_id: AddressId,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

/// List addresses.
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Address>>> {
    let limit = params.effective(state.config().list_limit);
    Ok(Json(state.addresses().list(limit).await?))
}

/// Show one address.
pub async fn show(
    State(state): State<AppState>,
    Query(IdParam { id }): Query<IdParam<AddressId>>,
) -> Result<Json<Address>> {
    Ok(Json(state.addresses().get(id).await?))
}

/// List a user's addresses.
pub async fn by_user(
    State(state): State<AppState>,
    Query(UserIdParam { user_id }): Query<UserIdParam>,
) -> Result<Json<Vec<Address>>> {
    Ok(Json(state.addresses().list_by_user(user_id).await?))
}

/// Create an address.
#[instrument(skip(state, request), fields(user_id = %request.user_id))]
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateAddressRequest>,
) -> Result<(StatusCode, Json<SavedAddress>)> {
    let saved = state
        .addresses()
        .create(request.user_id, &request.fields)
        .await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// Update an address.
#[instrument(skip(state, request), fields(address_id = %request.id))]
pub async fn update(
    State(state): State<AppState>,
    Json(request): Json<UpdateAddressRequest>,
) -> Result<Json<SavedAddress>> {
    let saved = state
        .addresses()
        .update(request.id, request.user_id, &request.fields)
        .await?;
    Ok(Json(saved))
}

/// Delete an address.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Json(request): Json<DeleteAddressRequest>,
) -> Result<Json<DeletedResponse>> {
    state
        .addresses()
        .delete(request.id, request.user_id)
        .await?;
    Ok(Json(DeletedResponse { deleted: true }))
}

/// Assign an address to an order.
#[instrument(skip(state))]
pub async fn assign_to_order(
    State(state): State<AppState>,
    Json(request): Json<AssignAddressRequest>,
) -> Result<Json<AddressAssignment>> {
    let assignment = state
        .coordinator()
        .assign_address_to_order(request.order_id, request.address_id)
        .await?;
    Ok(Json(assignment))
}
