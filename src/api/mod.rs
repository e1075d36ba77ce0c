//! Local JSON API for the browser front end.
//!
//! Exposes the form, prediction and result flow as HTTP endpoints under
//! `/api/`. `api_router()` returns a `Router` that can be mounted on any
//! axum server instance; `server` owns the listening lifecycle.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_server, ApiServer, ServerError};
pub use types::ApiContext;
