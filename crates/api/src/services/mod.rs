//! Business logic services for the order desk.
//!
//! # Services
//!
//! - `addresses` - Address writes with validation and post-commit events
//! - `orders` - Order placement, status changes, deletion
//! - `coordinator` - Keeps order status in step with address availability
//! - `events` - Address event bus connecting the two
//! - `users`, `roles` - Identity and role records

pub mod addresses;
pub mod coordinator;
pub mod events;
pub mod orders;
pub mod roles;
pub mod users;

use thiserror::Error;

use orderdesk_core::AddressId;

use crate::db::RepositoryError;

pub use addresses::{AddressService, SavedAddress};
pub use coordinator::OrderAddressCoordinator;
pub use events::{AddressEvent, AddressEventBus, AddressEventKind, AddressEventListener};
pub use orders::OrderService;
pub use roles::RoleService;
pub use users::UserService;

/// Errors returned by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input rejected before any storage access.
    #[error("{0}")]
    Validation(String),

    /// Storage-layer failure (not found, conflict, database).
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The address write committed but a listener reacting to it failed.
    #[error("address {address_id} saved, but updating its orders failed: {source}")]
    Cascade {
        address_id: AddressId,
        #[source]
        source: RepositoryError,
    },
}

impl ServiceError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
