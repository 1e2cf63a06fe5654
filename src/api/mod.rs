//! HTTP API for the chat front-end.
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Health check
//! - `GET /api/tools` - Tools the agent can call
//! - `POST /api/sessions` - Start a chat session
//! - `GET /api/sessions/:id` - Transcript and "working" flag
//! - `POST /api/sessions/:id/messages` - Submit a user message, wait for the reply
//! - `DELETE /api/sessions/:id` - Discard a session, cancelling its running turn

mod routes;
pub mod sessions;
pub mod types;

pub use routes::{app, serve, AppState};
