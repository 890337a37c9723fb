//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::{
    AddressEventBus, AddressService, OrderAddressCoordinator, OrderService, RoleService, UserService,
};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The pool is created once at startup and
/// handed to every service.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    addresses: AddressService,
    orders: OrderService,
    coordinator: OrderAddressCoordinator,
    users: UserService,
    roles: RoleService,
}

impl AppState {
    /// Wire services around `pool`.
    ///
    /// The coordinator is subscribed to address events, so every committed
    /// address create or update advances the owner's pending orders.
    #[must_use]
    pub fn new(config: ApiConfig, pool: PgPool) -> Self {
        let coordinator = OrderAddressCoordinator::new(pool.clone());
        let events = AddressEventBus::new().with_listener(Arc::new(coordinator.clone()));
        let addresses = AddressService::new(pool.clone(), events);
        let orders = OrderService::new(pool.clone(), config.unknown_products);
        let users = UserService::new(pool.clone());
        let roles = RoleService::new(pool.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                addresses,
                orders,
                coordinator,
                users,
                roles,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn addresses(&self) -> &AddressService {
        &self.inner.addresses
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    #[must_use]
    pub fn coordinator(&self) -> &OrderAddressCoordinator {
        &self.inner.coordinator
    }

    #[must_use]
    pub fn users(&self) -> &UserService {
        &self.inner.users
    }

    #[must_use]
    pub fn roles(&self) -> &RoleService {
        &self.inner.roles
    }
}
