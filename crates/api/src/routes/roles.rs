//! Role route handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use orderdesk_core::RoleId;

use super::{IdParam, ListParams};
use crate::error::Result;
use crate::models::Role;
use crate::state::AppState;

/// Body of `POST /roles/create`.
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `POST /roles/update`.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `POST /roles/delete`.
#[derive(Debug, Deserialize)]
pub struct DeleteRoleRequest {
    pub id: RoleId,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

/// List roles.
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Role>>> {
    let limit = params.effective(state.config().list_limit);
    Ok(Json(state.roles().list(limit).await?))
}

/// Show one role.
pub async fn show(
    State(state): State<AppState>,
    Query(IdParam { id }): Query<IdParam<RoleId>>,
) -> Result<Json<Role>> {
    Ok(Json(state.roles().get(id).await?))
}

/// Create a role.
#[instrument(skip(state, request))]
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<Role>)> {
    let role = state
        .roles()
        .create(&request.name, request.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(role)))
}

/// Rename a role.
#[instrument(skip(state, request), fields(role_id = %request.id))]
pub async fn update(
    State(state): State<AppState>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<Json<Role>> {
    let role = state
        .roles()
        .update(request.id, &request.name, request.description.as_deref())
        .await?;
    Ok(Json(role))
}

/// Delete a role.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Json(request): Json<DeleteRoleRequest>,
) -> Result<Json<DeletedResponse>> {
    state.roles().delete(request.id).await?;
    Ok(Json(DeletedResponse { deleted: true }))
}
