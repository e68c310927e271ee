//! The data-entry page.
//!
//! Generated from the field table, so the inputs always match the keys
//! `BillOfLading::from_form` reads.

use std::fmt::Write;
use std::sync::Arc;

use axum::{extract::State, response::Html};

use crate::model::{FieldId, CARGO_LINE_SEPARATOR};

use super::super::state::AppState;

/// Handle GET / - the bill of lading form.
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let engine = &state.engine;
    Html(render_form(
        &engine.config.company_name,
        engine.warnings(),
        |id| engine.captions.caption(id),
    ))
}

fn render_form(company: &str, warnings: &[String], caption: impl Fn(FieldId) -> String) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Bill of Lading - {}</title>\n<style>{}</style>\n</head>\n<body>\n\
         <h1>Bill of Lading</h1>\n",
        escape_html(company),
        STYLE
    );

    for warning in warnings {
        let _ = writeln!(html, "<p class=\"warning\">{}</p>", escape_html(warning));
    }

    html.push_str("<form method=\"post\" action=\"/bill\">\n<fieldset>\n");
    for id in FieldId::ALL {
        let spec = id.spec();
        let label = escape_html(&caption(id));
        let _ = writeln!(html, "<label for=\"{0}\">{1}</label>", spec.key, label);
        if spec.multiline {
            let _ = writeln!(html, "<textarea id=\"{0}\" name=\"{0}\" rows=\"3\"></textarea>", spec.key);
        } else {
            let _ = writeln!(html, "<input type=\"text\" id=\"{0}\" name=\"{0}\">", spec.key);
        }
    }
    html.push_str("</fieldset>\n<fieldset>\n");

    let _ = writeln!(
        html,
        "<label for=\"cargo_lines\">Additional cargo lines \
         (container {0} packages {0} description {0} weight {0} measurement, one per line)</label>\n\
         <textarea id=\"cargo_lines\" name=\"cargo_lines\" rows=\"6\"></textarea>",
        CARGO_LINE_SEPARATOR
    );
    html.push_str(
        "<label for=\"freight_terms\">Freight terms</label>\n\
         <select id=\"freight_terms\" name=\"freight_terms\">\n\
         <option value=\"prepaid\">Prepaid</option>\n\
         <option value=\"collect\">Collect</option>\n\
         </select>\n\
         <label for=\"tracking_url\">Tracking URL (printed as a QR code)</label>\n\
         <input type=\"url\" id=\"tracking_url\" name=\"tracking_url\">\n",
    );
    html.push_str(
        "</fieldset>\n<button type=\"submit\">Download PDF</button>\n</form>\n</body>\n</html>\n",
    );
    html
}

const STYLE: &str = "body{font-family:sans-serif;max-width:56rem;margin:2rem auto;padding:0 1rem}\
fieldset{display:grid;grid-template-columns:16rem 1fr;gap:.4rem .8rem;margin-bottom:1rem}\
textarea,input,select{font:inherit}\
.warning{background:#fff4e5;border-left:4px solid #f0a020;padding:.5rem .8rem}";

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
