//! User route handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use orderdesk_core::UserId;

use super::{IdParam, ListParams};
use crate::error::Result;
use crate::models::User;
use crate::state::AppState;

/// Body of `POST /users/create`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
}

/// Body of `POST /users/update`.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub id: UserId,
    pub email: String,
}

/// Body of `POST /users/delete`.
#[derive(Debug, Deserialize)]
pub struct DeleteUserRequest {
    pub id: UserId,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

/// List users.
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<User>>> {
    let limit = params.effective(state.config().list_limit);
    Ok(Json(state.users().list(limit).await?))
}

/// Show one user.
pub async fn show(
    State(state): State<AppState>,
    Query(IdParam { id }): Query<IdParam<UserId>>,
) -> Result<Json<User>> {
    Ok(Json(state.users().get(id).await?))
}

/// Create a user.
#[instrument(skip(state, request))]
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = state.users().create(&request.email).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Change a user's email.
#[instrument(skip(state, request), fields(user_id = %request.id))]
pub async fn update(
    State(state): State<AppState>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    Ok(Json(state.users().update(request.id, &request.email).await?))
}

/// Delete a user with no addresses or orders.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Json(request): Json<DeleteUserRequest>,
) -> Result<Json<DeletedResponse>> {
    state.users().delete(request.id).await?;
    Ok(Json(DeletedResponse { deleted: true }))
}
