//! # Styles
//!
//! Colours and the paragraph styles used by every cell on the form. The
//! [`StyleSheet`] is built once from the [`LayoutConfig`] at startup and then
//! passed by reference into the content mapper and the layout engine; nothing
//! looks styles up by name at render time.

use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;

/// An RGBA color with components in 0.0-1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    /// Parse `#rgb` or `#rrggbb`. Anything else falls back to black.
    pub fn hex(hex: &str) -> Self {
        let hex = hex.trim().trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0);
        let (r, g, b) = match hex.len() {
            3 if hex.is_ascii() => (
                channel(&hex[0..1].repeat(2)),
                channel(&hex[1..2].repeat(2)),
                channel(&hex[2..3].repeat(2)),
            ),
            6 if hex.is_ascii() => (channel(&hex[0..2]), channel(&hex[2..4]), channel(&hex[4..6])),
            _ => (0, 0, 0),
        };
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
            a: 1.0,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Which face a run of text is set in. The font context decides what
/// concrete font backs each role (a standard Helvetica face, or the
/// embedded custom font for values when one was loaded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontRole {
    Regular,
    Bold,
}

/// A resolved paragraph style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: FontRole,
    pub size: f64,
    /// Baseline-to-baseline distance in points.
    pub leading: f64,
    pub color: Color,
}

/// Horizontal alignment of a paragraph inside its cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
}

/// The full set of styles for one form.
#[derive(Debug, Clone)]
pub struct StyleSheet {
    /// Field captions: bold, accent coloured.
    pub caption: TextStyle,
    /// Field values.
    pub value: TextStyle,
    /// "BILL OF LADING" title in the header block.
    pub title: TextStyle,
    /// Company name under the title and in the logo fallback.
    pub company: TextStyle,
    /// Section headings between blocks.
    pub heading: TextStyle,
    pub border_color: Color,
    pub border_width: f64,
    /// Fill for header rows (goods table column captions).
    pub header_background: Option<Color>,
    /// Inner padding of every cell, all four sides.
    pub cell_padding: f64,
}

impl StyleSheet {
    pub fn from_config(config: &LayoutConfig) -> Self {
        let accent = Color::hex(&config.colors.accent);
        let text = Color::hex(&config.colors.text);
        let sizes = &config.font_sizes;
        Self {
            caption: TextStyle {
                font: FontRole::Bold,
                size: sizes.caption,
                leading: sizes.caption * 1.3,
                color: accent,
            },
            value: TextStyle {
                font: FontRole::Regular,
                size: sizes.value,
                leading: sizes.value * 1.375,
                color: text,
            },
            title: TextStyle {
                font: FontRole::Bold,
                size: sizes.title,
                leading: sizes.title * 1.2,
                color: accent,
            },
            company: TextStyle {
                font: FontRole::Bold,
                size: sizes.company,
                leading: sizes.company * 1.25,
                color: text,
            },
            heading: TextStyle {
                font: FontRole::Bold,
                size: sizes.heading,
                leading: sizes.heading * 1.3,
                color: text,
            },
            border_color: Color::hex(&config.colors.border),
            border_width: config.border_width,
            header_background: config.colors.header_background.as_deref().map(Color::hex),
            cell_padding: config.cell_padding,
        }
    }
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}
