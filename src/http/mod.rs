//! HTTP host adapter
//!
//! Exposes every bridge method as `POST /<methodName>`:
//! - 200 with the wrapped response on success
//! - 400 with `{message, code}` on rejection
//! - GET /events - Session notifications as server-sent events
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
