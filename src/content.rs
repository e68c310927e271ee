//! # Field-to-Content Mapper
//!
//! Turns a caption and a raw field value into something a grid cell can
//! render. A value's line breaks become explicit [`Inline::Break`]s so that
//! multi-line addresses keep their shape, and a missing value becomes the
//! configured placeholder. The mapper never yields "nothing": when there is
//! neither caption nor value the cell still gets [`CellContent::Empty`].

use crate::image_loader::LoadedImage;
use crate::model::{BillOfLading, Captions, FieldId};
use crate::style::{Align, StyleSheet, TextStyle};

/// A piece of a paragraph.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text { text: String, style: TextStyle },
    /// Explicit line break.
    Break,
}

/// Styled text with explicit breaks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    pub runs: Vec<Inline>,
    pub align: Align,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single-style paragraph; newlines in `text` become breaks.
    pub fn plain(text: &str, style: TextStyle) -> Self {
        let mut p = Self::new();
        p.push_text(text, style);
        p
    }

    pub fn aligned(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Append text, converting every `\n` into an explicit break. Empty
    /// lines produce only their break.
    pub fn push_text(&mut self, text: &str, style: TextStyle) {
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                self.runs.push(Inline::Break);
            }
            let line = line.trim_end_matches('\r');
            if !line.is_empty() {
                self.runs.push(Inline::Text {
                    text: line.to_string(),
                    style,
                });
            }
        }
    }

    pub fn push_break(&mut self) {
        self.runs.push(Inline::Break);
    }

    pub fn break_count(&self) -> usize {
        self.runs
            .iter()
            .filter(|r| matches!(r, Inline::Break))
            .count()
    }

    /// The paragraph's text with breaks rendered as `\n`.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            match run {
                Inline::Text { text, .. } => out.push_str(text),
                Inline::Break => out.push('\n'),
            }
        }
        out
    }

    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|r| match r {
            Inline::Text { text, .. } => text.trim().is_empty(),
            Inline::Break => true,
        })
    }
}

/// Why an image is in a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    Logo,
    QrCode,
}

/// An image placed in a cell, with its drawn size.
#[derive(Debug, Clone, PartialEq)]
pub struct CellImage {
    pub image: LoadedImage,
    pub role: ImageRole,
    /// Drawn size in points. `None` fits the image to the cell, keeping
    /// its aspect ratio.
    pub size: Option<(f64, f64)>,
}

/// What a grid cell shows.
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Text(Paragraph),
    Image(CellImage),
    /// A drawn but blank cell.
    Empty,
}

impl CellContent {
    pub fn paragraph(&self) -> Option<&Paragraph> {
        match self {
            CellContent::Text(p) => Some(p),
            _ => None,
        }
    }

    pub fn image_role(&self) -> Option<ImageRole> {
        match self {
            CellContent::Image(img) => Some(img.role),
            _ => None,
        }
    }

    pub fn plain_text(&self) -> String {
        self.paragraph().map(Paragraph::plain_text).unwrap_or_default()
    }
}

/// Which parts of a field a cell shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentMode {
    /// Caption, a break, then the value.
    Composite,
    /// Caption only (label row of a field group).
    Label,
    /// Value only (value row of a field group, manifest cells).
    Value,
}

/// A caption paired with its (possibly missing) value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue<'a> {
    pub caption: String,
    pub value: Option<&'a str>,
}

/// Build the content for one field.
///
/// Blank values are replaced by `placeholder`. The result is
/// [`CellContent::Empty`] only when nothing printable is left.
pub fn field_content(
    caption: &str,
    value: Option<&str>,
    mode: ContentMode,
    styles: &StyleSheet,
    placeholder: &str,
) -> CellContent {
    let value = value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(placeholder);
    let caption = caption.trim();

    let mut paragraph = Paragraph::new();
    match mode {
        ContentMode::Label => paragraph.push_text(caption, styles.caption),
        ContentMode::Value => paragraph.push_text(value, styles.value),
        ContentMode::Composite => {
            if caption.is_empty() {
                paragraph.push_text(value, styles.value);
            } else {
                paragraph.push_text(caption, styles.caption);
                if !value.trim().is_empty() {
                    paragraph.push_break();
                    paragraph.push_text(value, styles.value);
                }
            }
        }
    }

    if paragraph.is_blank() {
        CellContent::Empty
    } else {
        CellContent::Text(paragraph)
    }
}

/// Field content bound to one bill and one style sheet.
pub struct ContentBuilder<'a> {
    pub bill: &'a BillOfLading,
    pub styles: &'a StyleSheet,
    pub captions: &'a Captions,
    pub placeholder: &'a str,
}

impl<'a> ContentBuilder<'a> {
    pub fn field_value(&self, id: FieldId) -> FieldValue<'a> {
        FieldValue {
            caption: self.captions.caption(id),
            value: self.bill.value(id),
        }
    }

    pub fn field(&self, id: FieldId, mode: ContentMode) -> CellContent {
        let fv = self.field_value(id);
        field_content(&fv.caption, fv.value, mode, self.styles, self.placeholder)
    }

    pub fn composite(&self, id: FieldId) -> CellContent {
        self.field(id, ContentMode::Composite)
    }

    pub fn label(&self, id: FieldId) -> CellContent {
        self.field(id, ContentMode::Label)
    }

    pub fn value(&self, id: FieldId) -> CellContent {
        self.field(id, ContentMode::Value)
    }

    /// A raw value (a manifest cell) with placeholder substitution.
    pub fn raw_value(&self, value: &str) -> CellContent {
        field_content("", Some(value), ContentMode::Value, self.styles, self.placeholder)
    }

    pub fn text(&self, text: &str, style: TextStyle) -> CellContent {
        let p = Paragraph::plain(text, style);
        if p.is_blank() {
            CellContent::Empty
        } else {
            CellContent::Text(p)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::FontRole;

    fn sheet() -> StyleSheet {
        StyleSheet::default()
    }

    #[test]
    fn test_composite_has_caption_break_value() {
        let styles = sheet();
        let content = field_content(
            "(2) Shipper / Exporter",
            Some("ACME"),
            ContentMode::Composite,
            &styles,
            "N/A",
        );
        let p = content.paragraph().unwrap();
        assert_eq!(p.runs.len(), 3);
        match &p.runs[0] {
            Inline::Text { text, style } => {
                assert_eq!(text, "(2) Shipper / Exporter");
                assert_eq!(style.font, FontRole::Bold);
                assert_eq!(style.color, styles.caption.color);
            }
            other => panic!("expected caption, got {:?}", other),
        }
        assert_eq!(p.runs[1], Inline::Break);
        assert_eq!(p.plain_text(), "(2) Shipper / Exporter\nACME");
    }

    #[test]
    fn test_missing_value_uses_placeholder() {
        let styles = sheet();
        for value in [None, Some(""), Some("   \n ")] {
            let content =
                field_content("(3) Consignee", value, ContentMode::Composite, &styles, "N/A");
            assert_eq!(content.plain_text(), "(3) Consignee\nN/A");
            let content = field_content("", value, ContentMode::Value, &styles, "N/A");
            assert_eq!(content.plain_text(), "N/A");
        }
    }

    #[test]
    fn test_line_breaks_preserved() {
        let styles = sheet();
        let value = "ACME Ltd\nPier 4\n\nRotterdam";
        let content = field_content("", Some(value), ContentMode::Value, &styles, "N/A");
        let p = content.paragraph().unwrap();
        assert_eq!(p.break_count(), 3);
        assert_eq!(p.plain_text().split('\n').count(), value.split('\n').count());
        assert_eq!(p.plain_text(), value);

        let composite = field_content("(2) Shipper", Some(value), ContentMode::Composite, &styles, "N/A");
        // one break after the caption, then one per value line break
        assert_eq!(composite.paragraph().unwrap().break_count(), 4);
    }

    #[test]
    fn test_empty_caption_and_value_is_empty_cell() {
        let styles = sheet();
        assert_eq!(
            field_content("", None, ContentMode::Composite, &styles, ""),
            CellContent::Empty
        );
        assert_eq!(
            field_content("  ", Some("x"), ContentMode::Label, &styles, "N/A"),
            CellContent::Empty
        );
    }

    #[test]
    fn test_label_mode_ignores_value() {
        let styles = sheet();
        let content = field_content("(26) Rate", Some("12"), ContentMode::Label, &styles, "N/A");
        assert_eq!(content.plain_text(), "(26) Rate");
    }

    #[test]
    fn test_builder_uses_caption_table() {
        let styles = sheet();
        let captions = Captions::default();
        let bill = BillOfLading::new().with(FieldId::PortOfLoading, "Jebel Ali");
        let builder = ContentBuilder {
            bill: &bill,
            styles: &styles,
            captions: &captions,
            placeholder: "N/A",
        };
        assert_eq!(
            builder.composite(FieldId::PortOfLoading).plain_text(),
            "(14) Port of Loading\nJebel Ali"
        );
        assert_eq!(builder.value(FieldId::PortOfDischarge).plain_text(), "N/A");
        assert_eq!(builder.raw_value("").plain_text(), "N/A");
    }
}
