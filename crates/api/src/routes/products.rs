//! Product catalog route handlers.

use axum::{
    Json,
    extract::{Query, State},
};

use orderdesk_core::ProductId;

use super::{IdParam, ListParams};
use crate::db::{ProductRepository, RepositoryError};
use crate::error::Result;
use crate::models::Product;
use crate::state::AppState;

/// List products.
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Product>>> {
    let limit = params.effective(state.config().list_limit);
    let products = ProductRepository::new(state.pool()).list(limit).await?;
    Ok(Json(products))
}

/// Show one product.
pub async fn show(
    State(state): State<AppState>,
    Query(IdParam { id }): Query<IdParam<ProductId>>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or(RepositoryError::NotFound("product"))?;
    Ok(Json(product))
}
