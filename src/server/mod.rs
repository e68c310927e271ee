//! # HTTP Server
//!
//! The web form and the endpoints that turn a submitted bill into a PDF
//! download.
//!
//! ## Usage
//!
//! ```bash
//! lading serve --listen 0.0.0.0:8080 --config layout.json
//! ```
//!
//! Then open http://localhost:8080 in a browser to fill in a bill.

mod handlers;
mod state;

pub use state::AppState;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::BolError;
use crate::Engine;

/// The application routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::form::index))
        .route("/bill", post(handlers::bill::from_form))
        .route("/api/bill", post(handlers::bill::from_json))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: ServerConfig, engine: Engine) -> Result<(), BolError> {
    for warning in engine.warnings() {
        warn!("{}", warning);
    }
    let app = router(Arc::new(AppState::new(engine)));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            BolError::Config(format!("failed to bind to {}: {}", config.listen_addr, e))
        })?;
    info!(addr = %config.listen_addr, "lading server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| BolError::Render(format!("server error: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        let engine = Engine::new(LayoutConfig {
            logo_path: None,
            ..Default::default()
        });
        router(Arc::new(AppState::new(engine)))
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_form_page() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8_lossy(&body);
        assert!(html.contains("<form method=\"post\" action=\"/bill\">"));
        assert!(html.contains("(5A) B/L No."));
    }

    #[tokio::test]
    async fn test_form_post_downloads_pdf() {
        let response = app()
            .oneshot(
                Request::post("/bill")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("bl_number=MCL%2F2026%2F001&shipper=ACME%0D%0ARotterdam"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"MCL_2026_001.pdf\""
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.starts_with(b"%PDF-1.7"));
    }

    #[tokio::test]
    async fn test_json_post_downloads_pdf() {
        let response = app()
            .oneshot(
                Request::post("/api/bill")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{ "fields": { "bl_number": "MCL-001" } }"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"MCL-001.pdf\""
        );
    }
}
