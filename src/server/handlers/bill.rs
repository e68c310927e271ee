//! Bill rendering handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::{error, info};

use crate::model::BillOfLading;
use crate::RenderedBill;

use super::super::state::AppState;

/// Handle POST /bill - url-encoded form data to a PDF download.
pub async fn from_form(
    State(state): State<Arc<AppState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    info!(fields = form.len(), "bill submitted from form");
    render_response(state, BillOfLading::from_form(&form)).await
}

/// Handle POST /api/bill - JSON bill to a PDF download.
pub async fn from_json(State(state): State<Arc<AppState>>, Json(bill): Json<BillOfLading>) -> Response {
    info!(cargo_items = bill.cargo.len(), "bill submitted as JSON");
    render_response(state, bill).await
}

/// Render off the async runtime; a failure discards any partial output.
async fn render_response(state: Arc<AppState>, bill: BillOfLading) -> Response {
    let result = tokio::task::spawn_blocking(move || state.engine.render(&bill)).await;
    match result {
        Ok(Ok(rendered)) => pdf_response(rendered),
        Ok(Err(e)) => error_response(&format!("Could not generate the PDF: {}", e)),
        Err(e) => error_response(&format!("Task error: {}", e)),
    }
}

fn pdf_response(rendered: RenderedBill) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&rendered.filename)),
        ],
        rendered.bytes,
    )
        .into_response()
}

fn error_response(message: &str) -> Response {
    error!(error = %message, "render failed");
    (StatusCode::INTERNAL_SERVER_ERROR, message.to_string()).into_response()
}

/// Everything but alphanumerics and `-._~` is percent-encoded.
const RFC5987_ATTR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Header values must be ASCII: non-ASCII names get an ASCII fallback plus
/// the RFC 5987 `filename*` form.
fn content_disposition(filename: &str) -> String {
    if filename.is_ascii() {
        return format!("attachment; filename=\"{}\"", filename);
    }
    let fallback: String = filename
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();
    let encoded = utf8_percent_encode(filename, RFC5987_ATTR);
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_disposition() {
        assert_eq!(
            content_disposition("MCL-001.pdf"),
            "attachment; filename=\"MCL-001.pdf\""
        );
    }

    #[test]
    fn test_non_ascii_disposition() {
        assert_eq!(
            content_disposition("Ü1.pdf"),
            "attachment; filename=\"_1.pdf\"; filename*=UTF-8''%C3%9C1.pdf"
        );
        assert_eq!(
            content_disposition("Lieferschein Nr. ä~1.pdf"),
            "attachment; filename=\"Lieferschein Nr. _~1.pdf\"; filename*=UTF-8''Lieferschein%20Nr.%20%C3%A4~1.pdf"
        );
    }
}
