//! # Fonts
//!
//! Captions and headings are set in the standard Helvetica faces, which every
//! PDF viewer carries and which need no embedding. Field values can instead
//! use a TrueType font supplied by the operator (for scripts Helvetica cannot
//! show); it is parsed with ttf-parser at startup and embedded by the PDF
//! writer. A missing or broken font file is not an error: the engine falls
//! back to Helvetica and records a warning for the form page.

use std::collections::HashMap;
use std::path::Path;

use tracing::{info, warn};

use crate::style::FontRole;

/// A concrete face used to set text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFace {
    Helvetica,
    HelveticaBold,
    /// The embedded custom font.
    Custom,
}

impl FontFace {
    /// The PDF base font name for the standard faces.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            FontFace::Helvetica => "Helvetica",
            FontFace::HelveticaBold => "Helvetica-Bold",
            FontFace::Custom => "Custom",
        }
    }

    pub fn is_standard(&self) -> bool {
        !matches!(self, FontFace::Custom)
    }
}

/// Helvetica advance widths (1/1000 em) for U+0020..=U+007E, from the AFM.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold advance widths (1/1000 em) for U+0020..=U+007E.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Width used for characters outside the ASCII table.
const DEFAULT_WIDTH: u16 = 556;

fn standard_width(bold: bool, ch: char) -> u16 {
    let table = if bold {
        &HELVETICA_BOLD_WIDTHS
    } else {
        &HELVETICA_WIDTHS
    };
    match ch as u32 {
        code @ 0x20..=0x7E => table[(code - 0x20) as usize],
        0xA0 => table[0],
        _ => DEFAULT_WIDTH,
    }
}

/// Parsed metrics of the custom font.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
    pub ascender: i16,
    pub descender: i16,
    /// Maps characters to their glyph IDs in the font.
    pub glyph_ids: HashMap<char, u16>,
}

impl CustomFontMetrics {
    /// Advance of `ch` at `font_size`, in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let units = match self.advance_widths.get(&ch) {
            Some(&w) => w,
            None => self.default_advance,
        };
        font_size * f64::from(units) / f64::from(self.units_per_em)
    }

    /// Read the metrics of every character the font's Unicode cmap
    /// subtables map. `None` when the data is not a parseable font.
    pub fn from_font_data(data: &[u8]) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, 0).ok()?;
        let cmap = face.tables().cmap?;

        let mut glyph_ids = HashMap::new();
        for subtable in cmap.subtables.into_iter().filter(|s| s.is_unicode()) {
            subtable.codepoints(|cp| {
                let Some(ch) = char::from_u32(cp).filter(|c| !c.is_control()) else {
                    return;
                };
                if let Some(gid) = subtable.glyph_index(cp) {
                    glyph_ids.entry(ch).or_insert(gid.0);
                }
            });
        }
        if glyph_ids.is_empty() {
            return None;
        }

        let advance_widths: HashMap<char, u16> = glyph_ids
            .iter()
            .map(|(&ch, &gid)| {
                let advance = face.glyph_hor_advance(ttf_parser::GlyphId(gid)).unwrap_or(0);
                (ch, advance)
            })
            .collect();
        let units_per_em = face.units_per_em();
        let default_advance = advance_widths
            .get(&' ')
            .copied()
            .filter(|&w| w > 0)
            .unwrap_or(units_per_em / 2);

        Some(CustomFontMetrics {
            units_per_em,
            advance_widths,
            default_advance,
            ascender: face.ascender(),
            descender: face.descender(),
            glyph_ids,
        })
    }
}

/// A loaded TrueType font ready for embedding.
#[derive(Debug, Clone)]
pub struct CustomFont {
    /// PDF-safe name derived from the file name.
    pub name: String,
    pub data: Vec<u8>,
    pub metrics: CustomFontMetrics,
}

/// Process-wide font state, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct FontContext {
    custom: Option<CustomFont>,
}

impl FontContext {
    /// Standard fonts only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the optional custom font. Returns the context plus any warnings
    /// to show the user; a failed load leaves the standard fonts in place.
    pub fn load(path: Option<&Path>) -> (Self, Vec<String>) {
        let Some(path) = path else {
            return (Self::new(), Vec::new());
        };

        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                let msg = format!(
                    "Font file '{}' could not be read ({}); values are set in Helvetica.",
                    path.display(),
                    e
                );
                warn!("{}", msg);
                return (Self::new(), vec![msg]);
            }
        };

        match Self::from_font_data(font_name(path), data) {
            Some(ctx) => {
                info!(font = %path.display(), "loaded custom font");
                (ctx, Vec::new())
            }
            None => {
                let msg = format!(
                    "Font file '{}' is not a usable TrueType font; values are set in Helvetica.",
                    path.display()
                );
                warn!("{}", msg);
                (Self::new(), vec![msg])
            }
        }
    }

    /// Build a context around in-memory font data.
    pub fn from_font_data(name: String, data: Vec<u8>) -> Option<Self> {
        let metrics = CustomFontMetrics::from_font_data(&data)?;
        Some(Self {
            custom: Some(CustomFont {
                name,
                data,
                metrics,
            }),
        })
    }

    pub fn custom(&self) -> Option<&CustomFont> {
        self.custom.as_ref()
    }

    /// The face that backs a style role.
    pub fn face(&self, role: FontRole) -> FontFace {
        match role {
            FontRole::Bold => FontFace::HelveticaBold,
            FontRole::Regular if self.custom.is_some() => FontFace::Custom,
            FontRole::Regular => FontFace::Helvetica,
        }
    }

    pub fn char_width(&self, face: FontFace, ch: char, font_size: f64) -> f64 {
        match face {
            FontFace::Helvetica => standard_width(false, ch) as f64 / 1000.0 * font_size,
            FontFace::HelveticaBold => standard_width(true, ch) as f64 / 1000.0 * font_size,
            FontFace::Custom => match &self.custom {
                Some(font) => font.metrics.char_width(ch, font_size),
                None => standard_width(false, ch) as f64 / 1000.0 * font_size,
            },
        }
    }
}

/// A PDF name for the font: the file stem with anything but
/// alphanumerics, `-` and `_` removed.
fn font_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if name.is_empty() {
        "CustomFont".to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_widths() {
        let ctx = FontContext::new();
        assert!((ctx.char_width(FontFace::Helvetica, ' ', 10.0) - 2.78).abs() < 1e-9);
        assert!((ctx.char_width(FontFace::Helvetica, 'W', 1000.0) - 944.0).abs() < 1e-9);
        assert!((ctx.char_width(FontFace::HelveticaBold, 'm', 1000.0) - 889.0).abs() < 1e-9);
        assert!((ctx.char_width(FontFace::Helvetica, '~', 1000.0) - 584.0).abs() < 1e-9);
    }

    #[test]
    fn test_bold_is_wider() {
        let ctx = FontContext::new();
        let width = |face: FontFace| -> f64 {
            "Shipper / Exporter"
                .chars()
                .map(|ch| ctx.char_width(face, ch, 8.0))
                .sum()
        };
        let (regular, bold) = (width(FontFace::Helvetica), width(FontFace::HelveticaBold));
        assert!(bold > regular);
    }

    #[test]
    fn test_no_path_no_warning() {
        let (ctx, warnings) = FontContext::load(None);
        assert!(ctx.custom().is_none());
        assert!(warnings.is_empty());
        assert_eq!(ctx.face(FontRole::Regular), FontFace::Helvetica);
    }

    #[test]
    fn test_missing_font_falls_back_with_warning() {
        let (ctx, warnings) = FontContext::load(Some(Path::new("/nonexistent/Amiri.ttf")));
        assert!(ctx.custom().is_none());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Helvetica"));
    }

    #[test]
    fn test_garbage_font_falls_back_with_warning() {
        assert!(FontContext::from_font_data("X".into(), vec![0, 1, 2, 3]).is_none());
    }

    #[test]
    fn test_font_name_sanitised() {
        assert_eq!(font_name(Path::new("/fonts/Noto Naskh Arabic.ttf")), "NotoNaskhArabic");
        assert_eq!(font_name(Path::new("/fonts/###.ttf")), "CustomFont");
    }
}
