//! Core types for OrderDesk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod status;

pub use id::*;
pub use price::{MAX_LINE_QUANTITY, fits_storage, line_total, max_storable_amount, order_total};
pub use status::{OrderStatus, ParseStatusError};
