//! Post-commit address events.
//!
//! The address service publishes an [`AddressEvent`] after each committed
//! create or update. Listeners run in subscription order; the first failure
//! stops delivery and is reported as [`ServiceError::Cascade`], carrying the
//! ID of the address that is already saved.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use orderdesk_core::{AddressId, OrderId, UserId};

use super::ServiceError;
use crate::db::RepositoryError;

/// What happened to the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressEventKind {
    Created,
    Updated,
}

/// A committed address write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddressEvent {
    pub kind: AddressEventKind,
    pub address_id: AddressId,
    pub user_id: UserId,
}

/// Something that reacts to committed address writes.
#[async_trait]
pub trait AddressEventListener: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Handle one event, returning the orders it advanced.
    async fn on_address_event(&self, event: &AddressEvent) -> Result<Vec<OrderId>, RepositoryError>;
}

/// Fan-out of address events to listeners.
#[derive(Clone, Default)]
pub struct AddressEventBus {
    listeners: Vec<Arc<dyn AddressEventListener>>,
}

impl AddressEventBus {
    /// Create a bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener; listeners are called in the order they were added.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn AddressEventListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Number of subscribed listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver an event to every listener.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Cascade` for the first listener that fails.
    pub async fn publish(&self, event: &AddressEvent) -> Result<Vec<OrderId>, ServiceError> {
        let mut advanced = Vec::new();

        for listener in &self.listeners {
            match listener.on_address_event(event).await {
                Ok(ids) => {
                    debug!(listener = listener.name(), advanced = ids.len(), "Delivered address event");
                    advanced.extend(ids);
                }
                Err(source) => {
                    warn!(
                        listener = listener.name(),
                        address_id = %event.address_id,
                        error = %source,
                        "Address event listener failed"
                    );
                    return Err(ServiceError::Cascade {
                        address_id: event.address_id,
                        source,
                    });
                }
            }
        }

        Ok(advanced)
    }
}

impl fmt::Debug for AddressEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.listeners.iter().map(|l| l.name()))
            .finish()
    }
}
