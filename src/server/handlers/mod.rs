//! HTTP handlers for the server.

pub mod bill;
pub mod form;

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}
