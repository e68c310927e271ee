//! # Lading
//!
//! Bills of lading from a web form to a fixed-layout PDF.
//!
//! The printed form is a set of six-column grids. Every field has a number
//! and a caption, and sits in cells whose spans must add up exactly. A row
//! that doesn't is a layout defect, and it is reported when the grid is
//! built instead of silently producing a broken table.
//!
//! ## Architecture
//!
//! ```text
//! Form / JSON
//!       ↓
//!   [model]     : BillOfLading: field values, cargo items, tracking URL
//!       ↓
//!   [content]   : Caption + value paragraphs, placeholders
//!       ↓
//!   [grid]      : Row spans validated into a GridLayout
//!   [manifest]  : Cargo rows sized to the goods block
//!   [assets]    : Logo (or company name) and QR code
//!       ↓
//!   [document]  : Header, main grid, goods table, footer
//!       ↓
//!   [layout]    : Measured, wrapped and paginated
//!       ↓
//!   [pdf]       : Serialize to PDF bytes
//! ```

pub mod assets;
pub mod config;
pub mod content;
pub mod document;
pub mod error;
pub mod font;
pub mod grid;
pub mod image_loader;
pub mod layout;
pub mod manifest;
pub mod model;
pub mod pdf;
pub mod server;
pub mod style;
pub mod text;

use tracing::{info, warn};

use config::LayoutConfig;
use content::CellContent;
use document::Document;
use error::BolError;
use font::FontContext;
use layout::LayoutEngine;
use model::{apply_freight, BillOfLading, Captions, FieldId};
use pdf::PdfWriter;
use style::StyleSheet;

/// Everything that stays fixed between renders: configuration, styles,
/// fonts and the resolved logo. Built once at startup.
#[derive(Debug, Clone)]
pub struct Engine {
    pub config: LayoutConfig,
    pub styles: StyleSheet,
    pub fonts: FontContext,
    pub captions: Captions,
    logo: CellContent,
    warnings: Vec<String>,
}

impl Engine {
    pub fn new(config: LayoutConfig) -> Self {
        let styles = StyleSheet::from_config(&config);
        let (fonts, mut warnings) = FontContext::load(config.font_path.as_deref());
        let captions = Captions::from_config(&config);
        let logo = assets::resolve_logo(config.logo_path.as_deref(), &config.company_name, &styles);

        if let Some(path) = config.logo_path.as_deref().filter(|p| !p.trim().is_empty()) {
            if logo.image_role().is_none() {
                let shown = if path.starts_with("data:") { "data URI" } else { path };
                warnings.push(format!(
                    "Logo '{}' could not be loaded; the company name is shown instead.",
                    shown
                ));
            }
        }

        Self {
            config,
            styles,
            fonts,
            captions,
            logo,
            warnings,
        }
    }

    /// The header logo cell: image or company-name fallback.
    pub fn logo(&self) -> &CellContent {
        &self.logo
    }

    /// Startup problems worth showing the user (missing logo or font).
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn render(&self, bill: &BillOfLading) -> Result<RenderedBill, BolError> {
        render(bill, self)
    }
}

/// A finished PDF and the name to download it under.
#[derive(Debug, Clone)]
pub struct RenderedBill {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Render a bill to PDF bytes.
///
/// The bill itself is not modified; derived freight amounts are filled in
/// on a copy.
pub fn render(bill: &BillOfLading, engine: &Engine) -> Result<RenderedBill, BolError> {
    let mut bill = bill.clone();
    if let Some(amount) = apply_freight(&mut bill) {
        info!(amount, terms = ?bill.freight_terms, "computed freight amount");
    }

    let document = Document::build(&bill, engine)?;
    let pages = LayoutEngine::new(&engine.fonts, &engine.styles).layout(&document);
    let bytes = PdfWriter::new().write(&pages, &document.metadata, &engine.fonts)?;

    let filename = download_filename(bill.value(FieldId::BlNumber));
    if !document.has_qr_code() && bill.tracking_url().is_some() {
        warn!("tracking URL given but no QR code was drawn");
    }
    info!(
        filename = %filename,
        pages = pages.len(),
        cargo_items = bill.cargo.len(),
        bytes = bytes.len(),
        "rendered bill of lading"
    );
    Ok(RenderedBill { filename, bytes })
}

/// The download name for a bill: the B/L number with `/`, other
/// characters that are unsafe in file names, and whitespace replaced by
/// `_`, plus `.pdf`.
pub fn download_filename(bl_number: Option<&str>) -> String {
    let stem: String = bl_number
        .unwrap_or("")
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .collect();
    if stem.is_empty() {
        "bill_of_lading.pdf".to_string()
    } else {
        format!("{}.pdf", stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_filename() {
        assert_eq!(download_filename(Some("MCL-001")), "MCL-001.pdf");
        assert_eq!(download_filename(Some("MCL/2026/001")), "MCL_2026_001.pdf");
        assert_eq!(download_filename(Some(" A B ")), "A_B.pdf");
        assert_eq!(download_filename(Some("a\\b:c")), "a_b_c.pdf");
        assert_eq!(download_filename(Some("")), "bill_of_lading.pdf");
        assert_eq!(download_filename(None), "bill_of_lading.pdf");
    }

    #[test]
    fn test_missing_logo_is_a_warning() {
        let engine = Engine::new(LayoutConfig {
            logo_path: Some("/nonexistent/logo.png".to_string()),
            ..Default::default()
        });
        assert_eq!(engine.logo().plain_text(), "MCL SHIPPING");
        assert_eq!(engine.warnings().len(), 1);
        assert!(engine.warnings()[0].contains("/nonexistent/logo.png"));
    }

    #[test]
    fn test_no_logo_configured_is_silent() {
        let engine = Engine::new(LayoutConfig {
            logo_path: None,
            ..Default::default()
        });
        assert!(engine.warnings().is_empty());
    }

    #[test]
    fn test_render_does_not_modify_bill() {
        let engine = Engine::new(LayoutConfig {
            logo_path: None,
            ..Default::default()
        });
        let bill = BillOfLading::new()
            .with(FieldId::Rate, "10")
            .with(FieldId::RevenueTons, "2");
        let rendered = engine.render(&bill).unwrap();
        assert!(rendered.bytes.starts_with(b"%PDF-1.7"));
        assert_eq!(bill.value(FieldId::Prepaid), None);
    }
}
