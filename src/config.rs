//! # Layout Configuration
//!
//! Everything about the printed form that is a matter of taste rather than
//! structure: page size, margins, colours, font sizes, row heights, asset
//! paths and caption overrides. Every field has a default, so an empty JSON
//! object (or no config file at all) yields the standard A4 form.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::BolError;

const INCH: f64 = 72.0;

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Edge values (top, right, bottom, left) in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Page geometry for the rendered bill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub size: PageSize,
    pub margin: Edges,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            margin: Edges::uniform(0.5 * INCH),
        }
    }
}

impl PageConfig {
    pub fn content_width(&self) -> f64 {
        self.size.dimensions().0 - self.margin.horizontal()
    }

    pub fn content_height(&self) -> f64 {
        self.size.dimensions().1 - self.margin.vertical()
    }
}

/// Colours as `#rrggbb` strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub accent: String,
    pub text: String,
    pub border: String,
    /// Background of table header rows. `None` leaves them unfilled.
    pub header_background: Option<String>,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            accent: "#1f3a5f".to_string(),
            text: "#000000".to_string(),
            border: "#000000".to_string(),
            header_background: Some("#d3d3d3".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSizes {
    pub caption: f64,
    pub value: f64,
    pub title: f64,
    pub company: f64,
    pub heading: f64,
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            caption: 7.0,
            value: 8.0,
            title: 18.0,
            company: 10.0,
            heading: 9.0,
        }
    }
}

/// Minimum row heights (points) for the fixed blocks of the form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RowHeights {
    /// Party boxes: shipper, consignee, notify party.
    pub party: f64,
    /// Single-line routing boxes.
    pub routing: f64,
    /// Label rows of label/value field groups.
    pub label: f64,
    /// Value rows of label/value field groups.
    pub value: f64,
    /// Signature box in the footer.
    pub signature: f64,
}

impl Default for RowHeights {
    fn default() -> Self {
        Self {
            party: 0.7 * INCH,
            routing: 0.4 * INCH,
            label: 12.0,
            value: 18.0,
            signature: 0.9 * INCH,
        }
    }
}

/// Sizing of the cargo manifest block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Height shared by all item rows.
    pub total_height: f64,
    /// Floor for a single item row, however many items there are.
    pub min_row_height: f64,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            total_height: 2.0 * INCH,
            min_row_height: 18.0,
        }
    }
}

/// A caption override for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionOverride {
    /// Printed form number; `None` keeps the default number.
    #[serde(default)]
    pub number: Option<String>,
    pub caption: String,
}

/// The complete layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub page: PageConfig,
    pub company_name: String,
    /// Logo image (PNG or JPEG): a file path or a `data:image/...` URI.
    pub logo_path: Option<String>,
    /// TrueType font used for field values (non-Latin scripts).
    pub font_path: Option<PathBuf>,
    /// Substituted for any missing field value.
    pub placeholder: String,
    pub colors: ColorConfig,
    pub font_sizes: FontSizes,
    pub row_heights: RowHeights,
    pub manifest: ManifestConfig,
    pub border_width: f64,
    pub cell_padding: f64,
    /// Side length of the QR code cell.
    pub qr_size: f64,
    /// Caption overrides keyed by field key (e.g. `"doc_no"`).
    pub captions: HashMap<String, CaptionOverride>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page: PageConfig::default(),
            company_name: "MCL SHIPPING".to_string(),
            logo_path: Some("assets/logo.png".to_string()),
            font_path: None,
            placeholder: "N/A".to_string(),
            colors: ColorConfig::default(),
            font_sizes: FontSizes::default(),
            row_heights: RowHeights::default(),
            manifest: ManifestConfig::default(),
            border_width: 0.75,
            cell_padding: 3.0,
            qr_size: INCH,
            captions: HashMap::new(),
        }
    }
}

impl LayoutConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, BolError> {
        let config: LayoutConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, or the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, BolError> {
        match path {
            Some(path) => {
                let json = std::fs::read_to_string(path).map_err(|e| {
                    BolError::Config(format!("failed to read {}: {}", path.display(), e))
                })?;
                Self::from_json(&json)
            }
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), BolError> {
        if self.page.content_width() <= 0.0 || self.page.content_height() <= 0.0 {
            return Err(BolError::Config(
                "margins leave no room for content".to_string(),
            ));
        }
        if self.manifest.min_row_height <= 0.0 {
            return Err(BolError::Config(
                "manifest.min_row_height must be positive".to_string(),
            ));
        }
        if self.qr_size <= 0.0 {
            return Err(BolError::Config("qr_size must be positive".to_string()));
        }
        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let config = LayoutConfig::from_json("{}").unwrap();
        assert_eq!(config.placeholder, "N/A");
        assert_eq!(config.page.size, PageSize::A4);
        assert_eq!(config.page.margin, Edges::uniform(36.0));
    }

    #[test]
    fn test_partial_override() {
        let config = LayoutConfig::from_json(
            r#"{ "page": { "size": "Letter" }, "manifest": { "min_row_height": 24 } }"#,
        )
        .unwrap();
        assert_eq!(config.page.size.dimensions(), (612.0, 792.0));
        assert_eq!(config.page.margin, Edges::uniform(36.0));
        assert_eq!(config.manifest.min_row_height, 24.0);
        assert_eq!(config.manifest.total_height, 144.0);
    }

    #[test]
    fn test_caption_overrides() {
        let config = LayoutConfig::from_json(
            r#"{ "captions": { "doc_no": { "caption": "B/L No." } } }"#,
        )
        .unwrap();
        let ov = &config.captions["doc_no"];
        assert_eq!(ov.caption, "B/L No.");
        assert!(ov.number.is_none());
    }

    #[test]
    fn test_rejects_margins_larger_than_page() {
        let err = LayoutConfig::from_json(
            r#"{ "page": { "margin": { "top": 500, "right": 0, "bottom": 500, "left": 0 } } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, BolError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = LayoutConfig::load(Some(Path::new("/nonexistent/lading.json"))).unwrap_err();
        assert!(matches!(err, BolError::Config(_)));
    }
}
