//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Liveness
//! GET  /health/ready                 - Readiness (database reachable)
//!
//! # Products
//! GET  /products                     - Product listing
//! GET  /products/get?id=             - Product detail
//!
//! # Addresses
//! GET  /addresses                    - Address listing
//! GET  /addresses/get?id=            - Address detail
//! GET  /addresses/by-user?user_id=   - A user's addresses, default first
//! POST /addresses/create             - Create (advances pending orders)
//! POST /addresses/update             - Update (advances pending orders)
//! POST /addresses/delete             - Delete (409 while referenced)
//! POST /addresses/assign-to-order    - Bind an address to one order
//!
//! # Orders
//! GET  /orders                       - Order listing, newest first
//! GET  /orders/get?id=               - Order with items and address
//! GET  /orders/pending?user_id=      - A user's pending orders
//! POST /orders/place                 - Place an order
//! POST /orders/update-status         - Change one order's status
//! POST /orders/batch-update-status   - Change many orders' status
//! POST /orders/delete                - Delete an order and its items
//!
//! # Users and roles
//! GET  /users, /roles                - Listing
//! GET  /users/get?id=, /roles/get?id=
//! POST /users/create, /roles/create
//! POST /users/update, /roles/update
//! POST /users/delete, /roles/delete  - Users only when they own nothing
//! ```
//!
//! List endpoints accept `?limit=`, capped by `ORDERDESK_LIST_LIMIT`.

pub mod addresses;
pub mod orders;
pub mod products;
pub mod roles;
pub mod users;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware as axum_middleware,
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// `?limit=` query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
}

impl ListParams {
    /// Requested limit, clamped to `1..=cap`; the cap when absent or non-positive.
    #[must_use]
    pub fn effective(&self, cap: i64) -> i64 {
        self.limit.filter(|l| *l > 0).map_or(cap, |l| l.min(cap))
    }
}

/// `?id=` query parameter.
#[derive(Debug, Deserialize)]
pub struct IdParam<T> {
    pub id: T,
}

/// `?user_id=` query parameter.
#[derive(Debug, Deserialize)]
pub struct UserIdParam {
    pub user_id: orderdesk_core::UserId,
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/get", get(products::show))
}

/// Create the address routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(addresses::index))
        .route("/get", get(addresses::show))
        .route("/by-user", get(addresses::by_user))
        .route("/create", post(addresses::create))
        .route("/update", post(addresses::update))
        .route("/delete", post(addresses::delete))
        .route("/assign-to-order", post(addresses::assign_to_order))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/get", get(orders::show))
        .route("/pending", get(orders::pending))
        .route("/place", post(orders::place))
        .route("/update-status", post(orders::update_status))
        .route("/batch-update-status", post(orders::batch_update_status))
        .route("/delete", post(orders::delete))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index))
        .route("/get", get(users::show))
        .route("/create", post(users::create))
        .route("/update", post(users::update))
        .route("/delete", post(users::delete))
}

/// Create the role routes router.
pub fn role_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(roles::index))
        .route("/get", get(roles::show))
        .route("/create", post(roles::create))
        .route("/update", post(roles::update))
        .route("/delete", post(roles::delete))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/products", product_routes())
        .nest("/addresses", address_routes())
        .nest("/orders", order_routes())
        .nest("/users", user_routes())
        .nest("/roles", role_routes())
}

/// Build the full application: routes, state, and middleware.
pub fn app(state: AppState) -> Router {
    routes()
        .with_state(state)
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::config::ApiConfig;
    use crate::state::AppState;

    /// App over a pool that never connects; only paths that fail before
    /// touching storage can be exercised.
    pub fn offline_app() -> Router {
        let config = ApiConfig::from_lookup(|key| {
            (key == "ORDERDESK_DATABASE_URL")
                .then(|| "postgres://localhost:1/orderdesk_offline".to_owned())
        })
        .unwrap();
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/orderdesk_offline")
            .unwrap();
        super::app(AppState::new(config, pool))
    }

    pub async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_owned()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    pub async fn get(app: Router, uri: &str) -> StatusCode {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }
}
