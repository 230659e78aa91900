//! HTTP middleware stack for the server.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. Request ID (accept or generate `x-request-id`)
//! 3. `TraceLayer` (request span carrying the request ID)
//! 4. CORS (permissive; the API has no authentication)

pub mod request_id;

pub use request_id::{REQUEST_ID_HEADER, request_id, request_id_middleware};
