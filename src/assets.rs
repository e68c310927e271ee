//! # Assets
//!
//! The logo and the tracking QR code. Neither is essential: a logo that
//! cannot be read is replaced by the company name, and a bill without a
//! tracking URL simply has no QR cell. Nothing in here returns an error to
//! the caller.

use qrcode::{Color as QrColor, QrCode};
use tracing::warn;

use crate::content::{CellContent, CellImage, ImageRole, Paragraph};
use crate::image_loader::{load_image, ImagePixelData, LoadedImage};
use crate::style::{Align, StyleSheet};

/// Light modules around the symbol, as the QR standard asks for.
const QUIET_ZONE: usize = 4;

/// The logo cell: the image when it loads, otherwise the company name.
pub fn resolve_logo(path: Option<&str>, company_name: &str, styles: &StyleSheet) -> CellContent {
    let Some(path) = path.map(str::trim).filter(|p| !p.is_empty()) else {
        return logo_fallback(company_name, styles);
    };
    match load_image(path) {
        Ok(image) => CellContent::Image(CellImage {
            image,
            role: ImageRole::Logo,
            size: None,
        }),
        Err(e) => {
            warn!(logo = %short_source(path), error = %e, "logo unavailable, using company name");
            logo_fallback(company_name, styles)
        }
    }
}

/// The text shown in place of a missing logo.
pub fn logo_fallback(company_name: &str, styles: &StyleSheet) -> CellContent {
    CellContent::Text(Paragraph::plain(company_name, styles.company).aligned(Align::Center))
}

/// A QR cell for the tracking URL, drawn `size` points square. `None` when
/// there is no URL or it cannot be encoded.
pub fn qr_code(url: Option<&str>, size: f64) -> Option<CellContent> {
    let url = url.map(str::trim).filter(|u| !u.is_empty())?;
    match qr_image(url) {
        Ok(image) => Some(CellContent::Image(CellImage {
            image,
            role: ImageRole::QrCode,
            size: Some((size, size)),
        })),
        Err(e) => {
            warn!(error = %e, "tracking URL could not be encoded as a QR code");
            None
        }
    }
}

/// Encode `data` as a greyscale bitmap, one pixel per module, with the
/// quiet zone included.
pub fn qr_image(data: &str) -> Result<LoadedImage, qrcode::types::QrError> {
    let code = QrCode::new(data.as_bytes())?;
    let modules = code.width();
    let side = modules + 2 * QUIET_ZONE;
    let mut luma = vec![255u8; side * side];
    for (i, color) in code.to_colors().into_iter().enumerate() {
        if color == QrColor::Dark {
            let (y, x) = (i / modules + QUIET_ZONE, i % modules + QUIET_ZONE);
            luma[y * side + x] = 0;
        }
    }
    Ok(LoadedImage {
        pixel_data: ImagePixelData::Gray { luma },
        width_px: side as u32,
        height_px: side as u32,
    })
}

/// Data URIs are long; log only their prefix.
fn short_source(src: &str) -> &str {
    if src.starts_with("data:") {
        src.split(',').next().unwrap_or(src)
    } else {
        src
    }
}
