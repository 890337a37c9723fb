//! HTTP middleware stack for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (tag span, Sentry scope and response)

pub mod request_id;

pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
