//! # PDF Writer
//!
//! Serializes laid-out pages as a PDF 1.7 file.
//!
//! A bill needs only a small part of PDF: stroked and filled rectangles for
//! the grid, text in two or three faces, and at most two images per page
//! (the logo and the QR code). Objects are collected in memory, then written
//! out in order followed by the cross-reference table and the trailer.
//!
//! Object 1 is always the Catalog and object 2 the page tree; fonts and
//! images follow, then each page's content stream and page dictionary, and
//! finally the Info dictionary.
//!
//! ## Fonts
//!
//! Helvetica and Helvetica-Bold are referenced as standard Type1 fonts with
//! WinAnsiEncoding and never embedded. A custom TrueType font is embedded
//! whole as a CIDFontType2 with Identity-H encoding, so text in it is written
//! as glyph IDs, and a ToUnicode CMap keeps it searchable.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::document::Metadata;
use crate::error::BolError;
use crate::font::{CustomFont, FontContext, FontFace};
use crate::image_loader::{ImagePixelData, JpegColorSpace, LoadedImage};
use crate::layout::{DrawCommand, LayoutElement, LayoutPage, PositionedLine};
use crate::style::Color;
use crate::text::StyledChar;

pub struct PdfWriter;

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Faces in resource order (/F0, /F1, ...) with their object IDs.
    font_objects: Vec<(FontFace, usize)>,
    /// Glyph IDs for the embedded font, when one is used.
    custom_gids: HashMap<char, u16>,
    /// XObject IDs, indexed as /Im0, /Im1, ...
    image_objects: Vec<usize>,
    /// (page index, image position on the page) -> index into image_objects.
    image_index_map: HashMap<(usize, usize), usize>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write laid-out pages to a PDF byte vector.
    pub fn write(
        &self,
        pages: &[LayoutPage],
        metadata: &Metadata,
        fonts: &FontContext,
    ) -> Result<Vec<u8>, BolError> {
        let mut builder = PdfBuilder {
            objects: Vec::new(),
            font_objects: Vec::new(),
            custom_gids: HashMap::new(),
            image_objects: Vec::new(),
            image_index_map: HashMap::new(),
        };

        // 0 = placeholder (PDF objects are 1-indexed), 1 = Catalog, 2 = Pages
        for _ in 0..3 {
            builder.objects.push(PdfObject { data: vec![] });
        }

        self.register_fonts(&mut builder, pages, fonts)?;
        self.register_images(&mut builder, pages);

        let mut page_obj_ids: Vec<usize> = Vec::new();
        for (page_idx, page) in pages.iter().enumerate() {
            let content = self.build_content_stream(page, page_idx, &builder);
            let content_obj_id = push_stream(&mut builder, "", content.as_bytes());

            let page_obj_id = builder.objects.len();
            let font_resources = self.build_font_resource_dict(&builder.font_objects);
            let xobject_resources = self.build_xobject_resource_dict(page_idx, &builder);
            let resources = if xobject_resources.is_empty() {
                format!("/Font << {} >>", font_resources)
            } else {
                format!(
                    "/Font << {} >> /XObject << {} >>",
                    font_resources, xobject_resources
                )
            };
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                page.width, page.height, content_obj_id, resources
            );
            builder.objects.push(PdfObject {
                data: page_dict.into_bytes(),
            });
            page_obj_ids.push(page_obj_id);
        }

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();
        let kids: Vec<String> = page_obj_ids.iter().map(|id| format!("{} 0 R", id)).collect();
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            page_obj_ids.len()
        )
        .into_bytes();

        let info_obj_id = builder.objects.len();
        builder.objects.push(PdfObject {
            data: Self::info_dict(metadata).into_bytes(),
        });

        Ok(self.serialize(&builder, info_obj_id))
    }

    fn info_dict(metadata: &Metadata) -> String {
        let mut info = String::from("<< ");
        let entries = [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
            ("Creator", &metadata.creator),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                let _ = write!(info, "/{} ({}) ", key, Self::encode_winansi(value));
            }
        }
        info.push_str("/Producer (lading) >>");
        info
    }

    /// Build the PDF content stream for a single page.
    fn build_content_stream(&self, page: &LayoutPage, page_idx: usize, builder: &PdfBuilder) -> String {
        let mut stream = String::new();
        let mut image_counter = 0usize;
        for element in &page.elements {
            self.write_element(&mut stream, element, page.height, builder, page_idx, &mut image_counter);
        }
        stream
    }

    /// Write a single layout element (and its children) as PDF operators.
    fn write_element(
        &self,
        stream: &mut String,
        element: &LayoutElement,
        page_height: f64,
        builder: &PdfBuilder,
        page_idx: usize,
        image_counter: &mut usize,
    ) {
        match &element.draw {
            DrawCommand::None => {}

            DrawCommand::Rect {
                background,
                border_width,
                border_color,
            } => {
                let x = element.x;
                let y = page_height - element.y - element.height;
                let (w, h) = (element.width, element.height);

                if let Some(bg) = background {
                    let _ = writeln!(stream, "q\n{} rg", rgb(bg));
                    let _ = writeln!(stream, "{:.2} {:.2} {:.2} {:.2} re\nf\nQ", x, y, w, h);
                }
                if *border_width > 0.0 {
                    let _ = writeln!(stream, "q\n{} RG\n{:.2} w", rgb(border_color), border_width);
                    let _ = writeln!(stream, "{:.2} {:.2} {:.2} {:.2} re\nS\nQ", x, y, w, h);
                }
            }

            DrawCommand::Text { lines } => {
                for line in lines {
                    self.write_text_line(stream, line, page_height, builder);
                }
            }

            DrawCommand::Image { .. } => {
                let idx = *image_counter;
                *image_counter += 1;
                let x = element.x;
                let y = page_height - element.y - element.height;
                if let Some(&img_idx) = builder.image_index_map.get(&(page_idx, idx)) {
                    let _ = writeln!(
                        stream,
                        "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ",
                        element.width, element.height, x, y, img_idx
                    );
                }
            }
        }

        for child in &element.children {
            self.write_element(stream, child, page_height, builder, page_idx, image_counter);
        }
    }

    /// Emit one line as runs of same-styled characters, each positioned
    /// with an absolute text matrix.
    fn write_text_line(&self, stream: &mut String, line: &PositionedLine, page_height: f64, builder: &PdfBuilder) {
        let chars = &line.line.chars;
        let baseline = page_height - line.baseline;
        let mut start = 0;
        while start < chars.len() {
            let first = chars[start];
            let end = chars[start..]
                .iter()
                .position(|c| !same_style(c, &first))
                .map(|n| start + n)
                .unwrap_or(chars.len());
            let run: String = chars[start..end].iter().map(|c| c.ch).collect();
            if !run.trim().is_empty() {
                let x = line.x + line.line.char_positions[start];
                let font_idx = self.font_index(first.face, &builder.font_objects);
                let encoded = if first.face == FontFace::Custom {
                    self.encode_glyphs(&run, &builder.custom_gids)
                } else {
                    format!("({})", Self::encode_winansi(&run))
                };
                let _ = writeln!(
                    stream,
                    "BT\n{} rg\n/F{} {:.1} Tf\n1 0 0 1 {:.2} {:.2} Tm\n{} Tj\nET",
                    rgb(&first.color),
                    font_idx,
                    first.size,
                    x,
                    baseline,
                    encoded
                );
            }
            start = end;
        }
    }

    /// Hex glyph IDs for the embedded font. Characters the font lacks map
    /// to glyph 0.
    fn encode_glyphs(&self, text: &str, gids: &HashMap<char, u16>) -> String {
        let mut hex = String::from("<");
        for ch in text.chars() {
            let _ = write!(hex, "{:04X}", gids.get(&ch).copied().unwrap_or(0));
        }
        hex.push('>');
        hex
    }

    /// Register every face used on any page, in a stable order.
    fn register_fonts(
        &self,
        builder: &mut PdfBuilder,
        pages: &[LayoutPage],
        fonts: &FontContext,
    ) -> Result<(), BolError> {
        let mut used: Vec<FontFace> = Vec::new();
        let mut custom_chars: BTreeSet<char> = BTreeSet::new();
        for page in pages {
            for el in page.all_elements() {
                if let DrawCommand::Text { lines } = &el.draw {
                    for c in lines.iter().flat_map(|l| &l.line.chars) {
                        if !used.contains(&c.face) {
                            used.push(c.face);
                        }
                        if c.face == FontFace::Custom {
                            custom_chars.insert(c.ch);
                        }
                    }
                }
            }
        }
        // A page with no text still needs one font resource.
        if used.is_empty() {
            used.push(FontFace::Helvetica);
        }
        used.sort_by_key(|f| match f {
            FontFace::Helvetica => 0,
            FontFace::HelveticaBold => 1,
            FontFace::Custom => 2,
        });

        for face in used {
            let obj_id = if face.is_standard() {
                let id = builder.objects.len();
                builder.objects.push(PdfObject {
                    data: format!(
                        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                        face.pdf_name()
                    )
                    .into_bytes(),
                });
                id
            } else {
                let custom = fonts.custom().ok_or_else(|| {
                    BolError::Render("text set in the custom font but none is loaded".to_string())
                })?;
                Self::write_custom_font_objects(builder, custom, &custom_chars)?
            };
            builder.font_objects.push((face, obj_id));
        }
        Ok(())
    }

    /// Walk all pages, create XObjects for each image and remember which
    /// /ImN each image element uses.
    fn register_images(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) {
        for (page_idx, page) in pages.iter().enumerate() {
            let images = page.all_elements().into_iter().filter_map(|el| match &el.draw {
                DrawCommand::Image { image } => Some(image),
                _ => None,
            });
            for (elem_idx, image) in images.enumerate() {
                let img_idx = builder.image_objects.len();
                let obj_id = Self::write_image_xobject(builder, image);
                builder.image_objects.push(obj_id);
                builder.image_index_map.insert((page_idx, elem_idx), img_idx);
            }
        }
    }

    /// Write a single image as one or two XObjects. Returns the main
    /// XObject ID.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        let (w, h) = (image.width_px, image.height_px);
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let color_space = match color_space {
                    JpegColorSpace::DeviceRGB => "/DeviceRGB",
                    JpegColorSpace::DeviceGray => "/DeviceGray",
                };
                let obj_id = builder.objects.len();
                let mut obj: Vec<u8> = Vec::new();
                let _ = write!(
                    obj,
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace {} /BitsPerComponent 8 /Filter /DCTDecode \
                     /Length {} >>\nstream\n",
                    w,
                    h,
                    color_space,
                    data.len()
                );
                obj.extend_from_slice(data);
                obj.extend_from_slice(b"\nendstream");
                builder.objects.push(PdfObject { data: obj });
                obj_id
            }

            ImagePixelData::Decoded { rgb, alpha } => {
                let smask_ref = alpha
                    .as_ref()
                    .map(|alpha| {
                        let dict = image_dict(w, h, "/DeviceGray", "");
                        format!(" /SMask {} 0 R", push_stream(builder, &dict, alpha))
                    })
                    .unwrap_or_default();
                let dict = image_dict(w, h, "/DeviceRGB", &smask_ref);
                push_stream(builder, &dict, rgb)
            }

            ImagePixelData::Gray { luma } => {
                let dict = image_dict(w, h, "/DeviceGray", "");
                push_stream(builder, &dict, luma)
            }
        }
    }

    /// Build the /XObject resource dict entries for a specific page.
    fn build_xobject_resource_dict(&self, page_idx: usize, builder: &PdfBuilder) -> String {
        let mut entries: Vec<(usize, usize)> = builder
            .image_index_map
            .iter()
            .filter(|((p, _), _)| *p == page_idx)
            .map(|(_, &img_idx)| (img_idx, builder.image_objects[img_idx]))
            .collect();
        entries.sort_by_key(|(idx, _)| *idx);
        entries
            .iter()
            .map(|(idx, obj_id)| format!("/Im{} {} 0 R", idx, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Write the 5 CIDFont objects for the custom font. Returns the object
    /// ID of the Type0 root font dictionary.
    fn write_custom_font_objects(
        builder: &mut PdfBuilder,
        font: &CustomFont,
        used_chars: &BTreeSet<char>,
    ) -> Result<usize, BolError> {
        let face = ttf_parser::Face::parse(&font.data, 0)
            .map_err(|e| BolError::Render(format!("failed to parse font '{}': {}", font.name, e)))?;
        let metrics = &font.metrics;
        let scale = 1000.0 / metrics.units_per_em as f64;

        let char_to_gid: HashMap<char, u16> = used_chars
            .iter()
            .filter_map(|ch| metrics.glyph_ids.get(ch).map(|&gid| (*ch, gid)))
            .collect();

        // 1. FontFile2
        let fontfile2_id = push_stream(
            builder,
            &format!("/Length1 {}", font.data.len()),
            &font.data,
        );

        // 2. FontDescriptor
        let bbox = face.global_bounding_box();
        let descriptor = format!(
            "<< /Type /FontDescriptor /FontName /{} /Flags 4 \
             /FontBBox [{} {} {} {}] /ItalicAngle 0 \
             /Ascent {} /Descent {} /CapHeight {} /StemV 80 \
             /FontFile2 {} 0 R >>",
            font.name,
            (bbox.x_min as f64 * scale) as i32,
            (bbox.y_min as f64 * scale) as i32,
            (bbox.x_max as f64 * scale) as i32,
            (bbox.y_max as f64 * scale) as i32,
            (metrics.ascender as f64 * scale) as i32,
            (metrics.descender as f64 * scale) as i32,
            (face.capital_height().unwrap_or(metrics.ascender) as f64 * scale) as i32,
            fontfile2_id,
        );
        let descriptor_id = builder.objects.len();
        builder.objects.push(PdfObject {
            data: descriptor.into_bytes(),
        });

        // 3. CIDFont
        let cidfont = format!(
            "<< /Type /Font /Subtype /CIDFontType2 /BaseFont /{} \
             /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> \
             /FontDescriptor {} 0 R /DW {} /W {} /CIDToGIDMap /Identity >>",
            font.name,
            descriptor_id,
            (metrics.default_advance as f64 * scale) as u32,
            Self::build_w_array(&char_to_gid, &face, scale),
        );
        let cidfont_id = builder.objects.len();
        builder.objects.push(PdfObject {
            data: cidfont.into_bytes(),
        });

        // 4. ToUnicode
        let cmap = Self::build_tounicode_cmap(&char_to_gid, &font.name);
        let tounicode_id = push_stream(builder, "", cmap.as_bytes());

        // 5. Type0
        let type0 = format!(
            "<< /Type /Font /Subtype /Type0 /BaseFont /{} /Encoding /Identity-H \
             /DescendantFonts [{} 0 R] /ToUnicode {} 0 R >>",
            font.name, cidfont_id, tounicode_id
        );
        let type0_id = builder.objects.len();
        builder.objects.push(PdfObject {
            data: type0.into_bytes(),
        });

        builder.custom_gids = char_to_gid;
        Ok(type0_id)
    }

    /// Per-glyph widths: `[gid [width] gid [width] ...]`.
    fn build_w_array(char_to_gid: &HashMap<char, u16>, face: &ttf_parser::Face, scale: f64) -> String {
        let gids: BTreeSet<u16> = char_to_gid.values().copied().collect();
        let mut result = String::from("[");
        for gid in gids {
            let advance = face.glyph_hor_advance(ttf_parser::GlyphId(gid)).unwrap_or(0);
            let _ = write!(result, " {} [{}]", gid, (advance as f64 * scale) as u32);
        }
        result.push_str(" ]");
        result
    }

    /// Build a ToUnicode CMap so text can be copied out of the PDF.
    fn build_tounicode_cmap(char_to_gid: &HashMap<char, u16>, font_name: &str) -> String {
        let mut gid_to_unicode: Vec<(u16, u32)> = char_to_gid
            .iter()
            .map(|(&ch, &gid)| (gid, ch as u32))
            .collect();
        gid_to_unicode.sort();

        let mut cmap = String::new();
        cmap.push_str("/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n");
        cmap.push_str("/CIDSystemInfo\n<< /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        let _ = writeln!(cmap, "/CMapName /{}-UTF16 def", font_name);
        cmap.push_str("/CMapType 2 def\n1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

        // at most 100 entries per bfchar block
        for chunk in gid_to_unicode.chunks(100) {
            let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
            for &(gid, unicode) in chunk {
                let _ = writeln!(cmap, "<{:04X}> <{}>", gid, utf16_hex(unicode));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
        cmap
    }

    fn build_font_resource_dict(&self, font_objects: &[(FontFace, usize)]) -> String {
        font_objects
            .iter()
            .enumerate()
            .map(|(i, (_, obj_id))| format!("/F{} {} 0 R", i, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The /Fn index for a face, falling back to the first font.
    fn font_index(&self, face: FontFace, font_objects: &[(FontFace, usize)]) -> usize {
        font_objects
            .iter()
            .position(|(f, _)| *f == face)
            .unwrap_or(0)
    }

    /// Encode text as the body of a PDF literal string in WinAnsiEncoding.
    /// Characters outside the encoding become `?`.
    fn encode_winansi(text: &str) -> String {
        let mut out = String::new();
        for ch in text.chars() {
            let b = Self::unicode_to_winansi(ch).unwrap_or(b'?');
            match b {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                0x20..=0x7E => out.push(b as char),
                _ => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// Map a Unicode codepoint to a WinAnsiEncoding byte value.
    ///
    /// WinAnsiEncoding is based on Windows-1252: 0x20..=0x7E and
    /// 0xA0..=0xFF map directly, 0x80..=0x9F hold typographic extras.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
            return Some(cp as u8);
        }
        match cp {
            0x20AC => Some(0x80), // Euro sign
            0x201A => Some(0x82),
            0x0192 => Some(0x83),
            0x201E => Some(0x84),
            0x2026 => Some(0x85), // Horizontal ellipsis
            0x2020 => Some(0x86),
            0x2021 => Some(0x87),
            0x02C6 => Some(0x88),
            0x2030 => Some(0x89),
            0x0160 => Some(0x8A),
            0x2039 => Some(0x8B),
            0x0152 => Some(0x8C),
            0x017D => Some(0x8E),
            0x2018 => Some(0x91), // Quotation marks
            0x2019 => Some(0x92),
            0x201C => Some(0x93),
            0x201D => Some(0x94),
            0x2022 => Some(0x95), // Bullet
            0x2013 => Some(0x96), // En dash
            0x2014 => Some(0x97), // Em dash
            0x02DC => Some(0x98),
            0x2122 => Some(0x99), // Trade mark sign
            0x0161 => Some(0x9A),
            0x203A => Some(0x9B),
            0x0153 => Some(0x9C),
            0x017E => Some(0x9E),
            0x0178 => Some(0x9F),
            _ => None,
        }
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        output.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );
        output
    }
}

/// Append a FlateDecode stream object. `extra` goes into the dictionary
/// after /Length and /Filter. Returns the object ID.
fn push_stream(builder: &mut PdfBuilder, extra: &str, data: &[u8]) -> usize {
    let compressed = compress_to_vec_zlib(data, 6);
    let id = builder.objects.len();
    let mut obj: Vec<u8> = Vec::new();
    let extra = if extra.is_empty() {
        String::new()
    } else {
        format!(" {}", extra)
    };
    let _ = write!(
        obj,
        "<< /Length {} /Filter /FlateDecode{} >>\nstream\n",
        compressed.len(),
        extra
    );
    obj.extend_from_slice(&compressed);
    obj.extend_from_slice(b"\nendstream");
    builder.objects.push(PdfObject { data: obj });
    id
}

fn image_dict(width: u32, height: u32, color_space: &str, extra: &str) -> String {
    format!(
        "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} /BitsPerComponent 8{}",
        width, height, color_space, extra
    )
}

fn rgb(c: &Color) -> String {
    format!("{:.3} {:.3} {:.3}", c.r, c.g, c.b)
}

fn same_style(a: &StyledChar, b: &StyledChar) -> bool {
    a.face == b.face && a.size == b.size && a.color == b.color
}

/// UTF-16BE hex for a code point (surrogate pair above the BMP).
fn utf16_hex(cp: u32) -> String {
    let mut buf = [0u16; 2];
    match char::from_u32(cp) {
        Some(ch) => ch
            .encode_utf16(&mut buf)
            .iter()
            .map(|u| format!("{:04X}", u))
            .collect(),
        None => "FFFD".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::TextLine;
    use miniz_oxide::inflate::decompress_to_vec_zlib;

    fn text_page(text: &str, face: FontFace) -> LayoutPage {
        let chars: Vec<StyledChar> = text
            .chars()
            .map(|ch| StyledChar {
                ch,
                face,
                size: 8.0,
                color: Color::BLACK,
            })
            .collect();
        let positions = (0..chars.len()).map(|i| i as f64 * 4.0).collect();
        LayoutPage {
            width: 595.28,
            height: 841.89,
            elements: vec![LayoutElement {
                x: 36.0,
                y: 36.0,
                width: 100.0,
                height: 11.0,
                draw: DrawCommand::Text {
                    lines: vec![PositionedLine {
                        x: 36.0,
                        baseline: 45.0,
                        line: TextLine {
                            chars,
                            char_positions: positions,
                            width: 40.0,
                            height: 11.0,
                            font_size: 8.0,
                        },
                    }],
                },
                children: vec![],
                node_type: "Text",
            }],
        }
    }

    /// Decompress every FlateDecode stream in the file and join them.
    fn inflate_streams(pdf: &[u8]) -> String {
        let mut out = String::new();
        let mut rest = pdf;
        while let Some(start) = find(rest, b"stream\n") {
            let body = &rest[start + 7..];
            let Some(end) = find(body, b"\nendstream") else { break };
            if let Ok(data) = decompress_to_vec_zlib(&body[..end]) {
                out.push_str(&String::from_utf8_lossy(&data));
            }
            rest = &body[end + b"\nendstream".len()..];
        }
        out
    }

    fn find(hay: &[u8], needle: &[u8]) -> Option<usize> {
        hay.windows(needle.len()).position(|w| w == needle)
    }

    #[test]
    fn test_encode_winansi() {
        assert_eq!(PdfWriter::encode_winansi("Hello (World)"), "Hello \\(World\\)");
        assert_eq!(PdfWriter::encode_winansi("a\\b"), "a\\\\b");
        assert_eq!(PdfWriter::encode_winansi("café"), "caf\\351");
        assert_eq!(PdfWriter::encode_winansi("€"), "\\200");
        assert_eq!(PdfWriter::encode_winansi("中"), "?");
    }

    #[test]
    fn test_empty_document_produces_valid_pdf() {
        let page = LayoutPage {
            width: 595.28,
            height: 841.89,
            elements: vec![],
        };
        let bytes = PdfWriter::new()
            .write(&[page], &Metadata::default(), &FontContext::new())
            .unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(text.trim_end().ends_with("%%EOF"));
        assert!(text.contains("/Type /Catalog"));
        assert!(text.contains("/Count 1"));
        assert!(text.contains("/BaseFont /Helvetica "));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let bytes = PdfWriter::new()
            .write(&[text_page("B/L", FontFace::Helvetica)], &Metadata::default(), &FontContext::new())
            .unwrap();
        let xref = find(&bytes, b"xref\n").unwrap();
        let table = String::from_utf8_lossy(&bytes[xref..]);
        let first_entry = table.lines().nth(3).unwrap();
        let offset: usize = first_entry[..10].parse().unwrap();
        assert!(bytes[offset..].starts_with(b"1 0 obj"));
    }

    #[test]
    fn test_metadata_in_pdf() {
        let metadata = Metadata {
            title: Some("Bill of Lading MCL-001".to_string()),
            author: Some("MCL SHIPPING".to_string()),
            ..Metadata::default()
        };
        let bytes = PdfWriter::new()
            .write(&[text_page("x", FontFace::Helvetica)], &metadata, &FontContext::new())
            .unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Title (Bill of Lading MCL-001)"));
        assert!(text.contains("/Author (MCL SHIPPING)"));
        assert!(text.contains("/Info "));
    }

    #[test]
    fn test_text_written_to_content_stream() {
        let bytes = PdfWriter::new()
            .write(&[text_page("MCL-001", FontFace::HelveticaBold)], &Metadata::default(), &FontContext::new())
            .unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/BaseFont /Helvetica-Bold"));
        let streams = inflate_streams(&bytes);
        assert!(streams.contains("(MCL-001) Tj"), "{}", streams);
        assert!(streams.contains("/F0 8.0 Tf"));
        // baseline flipped to PDF coordinates
        assert!(streams.contains("1 0 0 1 36.00 796.89 Tm"));
    }

    #[test]
    fn test_custom_face_without_font_is_error() {
        let err = PdfWriter::new()
            .write(&[text_page("x", FontFace::Custom)], &Metadata::default(), &FontContext::new())
            .unwrap_err();
        assert!(matches!(err, BolError::Render(_)));
    }

    #[test]
    fn test_gray_image_xobject() {
        let page = LayoutPage {
            width: 200.0,
            height: 200.0,
            elements: vec![LayoutElement {
                x: 10.0,
                y: 10.0,
                width: 50.0,
                height: 50.0,
                draw: DrawCommand::Image {
                    image: LoadedImage {
                        pixel_data: ImagePixelData::Gray { luma: vec![0, 255, 255, 0] },
                        width_px: 2,
                        height_px: 2,
                    },
                },
                children: vec![],
                node_type: "Image",
            }],
        };
        let bytes = PdfWriter::new()
            .write(&[page], &Metadata::default(), &FontContext::new())
            .unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Subtype /Image /Width 2 /Height 2 /ColorSpace /DeviceGray"));
        assert!(text.contains("/XObject << /Im0 "));
        assert!(inflate_streams(&bytes).contains("/Im0 Do"));
    }

    #[test]
    fn test_tounicode_cmap_format() {
        let mut map = HashMap::new();
        map.insert('A', 36u16);
        map.insert('\u{1F600}', 900u16);
        let cmap = PdfWriter::build_tounicode_cmap(&map, "Amiri");
        assert!(cmap.contains("/CMapName /Amiri-UTF16 def"));
        assert!(cmap.contains("2 beginbfchar"));
        assert!(cmap.contains("<0024> <0041>"));
        assert!(cmap.contains("<0384> <D83DDE00>"));
    }

    #[test]
    fn test_hex_glyph_encoding() {
        let mut gids = HashMap::new();
        gids.insert('a', 68u16);
        let hex = PdfWriter::new().encode_glyphs("ab", &gids);
        assert_eq!(hex, "<00440000>");
    }
}
