//! # Layout Engine
//!
//! Places a [`Document`] onto pages. Blocks flow top to bottom inside the
//! page margins; tables are measured first (see [`table`]) and then placed
//! band by band. When a band does not fit in the space left on the page, a
//! new page starts, and tables with header rows repeat them there before the
//! band.
//!
//! The output is a list of [`LayoutPage`]s whose elements carry absolute
//! positions (top-left origin, points) and what to draw. The PDF writer
//! flips to PDF coordinates; nothing else here knows about PDF.

pub mod table;

use crate::config::PageConfig;
use crate::content::{CellContent, CellImage};
use crate::document::{Block, Document, TableBlock};
use crate::font::FontContext;
use crate::grid::GridCell;
use crate::image_loader::LoadedImage;
use crate::style::{Align, Color, StyleSheet};
use crate::text::{lines_height, wrap_paragraph, TextLine};

use table::TableMetrics;

/// A fully laid-out page ready for PDF serialization.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub elements: Vec<LayoutElement>,
}

/// A positioned element on a page.
#[derive(Debug, Clone)]
pub struct LayoutElement {
    /// Absolute position on the page (top-left corner).
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub draw: DrawCommand,
    /// Child elements, also positioned relative to the page.
    pub children: Vec<LayoutElement>,
    /// Logical element type ("Table", "TableRow", "TableCell", ...).
    pub node_type: &'static str,
}

/// What to actually draw for an element.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// Nothing to draw (just a container).
    None,
    /// A filled and/or stroked rectangle.
    Rect {
        background: Option<Color>,
        border_width: f64,
        border_color: Color,
    },
    Text { lines: Vec<PositionedLine> },
    Image { image: LoadedImage },
}

/// A wrapped line at its page position.
#[derive(Debug, Clone)]
pub struct PositionedLine {
    pub x: f64,
    /// Baseline, measured from the top of the page.
    pub baseline: f64,
    pub line: TextLine,
}

impl LayoutPage {
    /// Every element on the page, depth first.
    pub fn all_elements(&self) -> Vec<&LayoutElement> {
        fn walk<'a>(els: &'a [LayoutElement], out: &mut Vec<&'a LayoutElement>) {
            for el in els {
                out.push(el);
                walk(&el.children, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.elements, &mut out);
        out
    }

    /// The page's text, one entry per line, in drawing order.
    pub fn text_lines(&self) -> Vec<String> {
        self.all_elements()
            .into_iter()
            .filter_map(|el| match &el.draw {
                DrawCommand::Text { lines } => Some(lines),
                _ => None,
            })
            .flatten()
            .map(|l| l.line.text())
            .collect()
    }
}

/// Tracks where we are on the current page.
#[derive(Debug, Clone)]
struct PageCursor {
    page: PageConfig,
    /// Offset from the top of the content area.
    y: f64,
    elements: Vec<LayoutElement>,
}

impl PageCursor {
    fn new(page: PageConfig) -> Self {
        Self {
            page,
            y: 0.0,
            elements: Vec::new(),
        }
    }

    fn content_x(&self) -> f64 {
        self.page.margin.left
    }

    fn content_width(&self) -> f64 {
        self.page.content_width()
    }

    fn top(&self) -> f64 {
        self.page.margin.top + self.y
    }

    fn remaining_height(&self) -> f64 {
        (self.page.content_height() - self.y).max(0.0)
    }

    fn at_page_top(&self) -> bool {
        self.y <= 0.0
    }

    fn finalize(&mut self) -> LayoutPage {
        let (width, height) = self.page.size.dimensions();
        self.y = 0.0;
        LayoutPage {
            width,
            height,
            elements: std::mem::take(&mut self.elements),
        }
    }
}

pub struct LayoutEngine<'a> {
    fonts: &'a FontContext,
    styles: &'a StyleSheet,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(fonts: &'a FontContext, styles: &'a StyleSheet) -> Self {
        Self { fonts, styles }
    }

    /// Lay out the document. Always yields at least one page.
    pub fn layout(&self, document: &Document) -> Vec<LayoutPage> {
        let mut pages = Vec::new();
        let mut cursor = PageCursor::new(document.page);

        for (i, block) in document.blocks.iter().enumerate() {
            match block {
                Block::Spacer(h) => {
                    if !cursor.at_page_top() {
                        cursor.y += h;
                    }
                }
                Block::Heading(paragraph) => {
                    let lines = wrap_paragraph(paragraph, self.fonts, cursor.content_width());
                    let height = lines_height(&lines) + self.styles.cell_padding;
                    // a heading stays with the start of the table it introduces
                    let keep_with = match document.blocks.get(i + 1) {
                        Some(Block::Table(next)) => {
                            TableMetrics::measure(next, cursor.content_width(), self.fonts, self.styles)
                                .lead_height(next.header_rows)
                        }
                        _ => 0.0,
                    };
                    if height + keep_with > cursor.remaining_height() && !cursor.at_page_top() {
                        pages.push(cursor.finalize());
                    }
                    let (x, y, w) = (cursor.content_x(), cursor.top(), cursor.content_width());
                    cursor.elements.push(self.text_element(lines, x, y, w, paragraph.align));
                    cursor.y += height;
                }
                Block::Table(table) => self.layout_table(table, &mut cursor, &mut pages),
            }
        }

        pages.push(cursor.finalize());
        pages
    }

    fn layout_table(&self, table: &TableBlock, cursor: &mut PageCursor, pages: &mut Vec<LayoutPage>) {
        let metrics = TableMetrics::measure(table, cursor.content_width(), self.fonts, self.styles);
        let header_bands: Vec<_> = metrics
            .bands
            .iter()
            .filter(|b| b.start < table.header_rows)
            .cloned()
            .collect();

        let mut rows: Vec<LayoutElement> = Vec::new();
        let mut table_top = cursor.top();
        let mut placed_any = false;

        for (i, band) in metrics.bands.iter().enumerate() {
            let is_header = band.start < table.header_rows;
            // the header goes with the first body band
            let needed = match (is_header, i) {
                (true, 0) => metrics.lead_height(table.header_rows),
                (true, _) => 0.0,
                (false, _) => metrics.band_height(band),
            };

            if needed > cursor.remaining_height() && !cursor.at_page_top() {
                if !rows.is_empty() {
                    let done = table_element(std::mem::take(&mut rows), &metrics, cursor, table_top);
                    cursor.elements.push(done);
                }
                pages.push(cursor.finalize());
                table_top = cursor.top();
                if placed_any && !is_header {
                    for header in &header_bands {
                        self.place_band(table, &metrics, header, cursor, &mut rows);
                    }
                }
            }

            self.place_band(table, &metrics, band, cursor, &mut rows);
            placed_any = true;
        }

        if !rows.is_empty() {
            let done = table_element(rows, &metrics, cursor, table_top);
            cursor.elements.push(done);
        }
    }

    fn place_band(
        &self,
        table: &TableBlock,
        metrics: &TableMetrics,
        band: &std::ops::Range<usize>,
        cursor: &mut PageCursor,
        rows: &mut Vec<LayoutElement>,
    ) {
        let x = cursor.content_x();
        let mut row_y = cursor.top();
        for r in band.clone() {
            let height = metrics.row_heights[r];
            let cells = table
                .grid
                .cells_in_row(r)
                .map(|cell| {
                    let cx = x + metrics.col_offsets[cell.col];
                    self.cell_element(cell, metrics, cx, row_y, r < table.header_rows)
                })
                .collect();
            rows.push(LayoutElement {
                x,
                y: row_y,
                width: metrics.total_width(),
                height,
                draw: DrawCommand::None,
                children: cells,
                node_type: "TableRow",
            });
            row_y += height;
        }
        cursor.y += metrics.band_height(band);
    }

    fn cell_element(
        &self,
        cell: &GridCell,
        metrics: &TableMetrics,
        x: f64,
        y: f64,
        is_header: bool,
    ) -> LayoutElement {
        let width = metrics.span_width(cell);
        let height = metrics.span_height(cell);
        let pad = self.styles.cell_padding;
        let (ix, iy, iw, ih) = (x + pad, y + pad, width - 2.0 * pad, height - 2.0 * pad);

        let content = match &cell.content {
            CellContent::Text(p) => metrics
                .lines
                .get(&(cell.row, cell.col))
                .map(|lines| self.text_element(lines.clone(), ix, iy, iw, p.align)),
            CellContent::Image(img) => Some(image_element(img, ix, iy, iw, ih)),
            CellContent::Empty => None,
        };

        LayoutElement {
            x,
            y,
            width,
            height,
            draw: DrawCommand::Rect {
                background: if is_header { self.styles.header_background } else { None },
                border_width: self.styles.border_width,
                border_color: self.styles.border_color,
            },
            children: content.into_iter().collect(),
            node_type: "TableCell",
        }
    }

    fn text_element(&self, lines: Vec<TextLine>, x: f64, y: f64, width: f64, align: Align) -> LayoutElement {
        let height = lines_height(&lines);
        let mut top = y;
        let positioned = lines
            .into_iter()
            .map(|line| {
                let dx = match align {
                    Align::Left => 0.0,
                    Align::Center => ((width - line.width) / 2.0).max(0.0),
                };
                let baseline = top + (line.height - line.font_size) / 2.0 + line.font_size * 0.8;
                top += line.height;
                PositionedLine {
                    x: x + dx,
                    baseline,
                    line,
                }
            })
            .collect();
        LayoutElement {
            x,
            y,
            width,
            height,
            draw: DrawCommand::Text { lines: positioned },
            children: Vec::new(),
            node_type: "Text",
        }
    }
}

fn table_element(rows: Vec<LayoutElement>, metrics: &TableMetrics, cursor: &PageCursor, top: f64) -> LayoutElement {
    LayoutElement {
        x: cursor.content_x(),
        y: top,
        width: metrics.total_width(),
        height: cursor.top() - top,
        draw: DrawCommand::None,
        children: rows,
        node_type: "Table",
    }
}

/// Fit an image into the inner box, keeping its aspect ratio, centred.
fn image_element(img: &CellImage, x: f64, y: f64, width: f64, height: f64) -> LayoutElement {
    let (w, h) = match img.size {
        Some((w, h)) => {
            let scale = (width / w).min(height / h).min(1.0).max(0.0);
            (w * scale, h * scale)
        }
        None => {
            let aspect = img.image.aspect_ratio();
            let w = width.max(0.0);
            let h = w / aspect;
            if h > height {
                (height.max(0.0) * aspect, height.max(0.0))
            } else {
                (w, h)
            }
        }
    };
    LayoutElement {
        x: x + (width - w) / 2.0,
        y: y + (height - h) / 2.0,
        width: w,
        height: h,
        draw: DrawCommand::Image {
            image: img.image.clone(),
        },
        children: Vec::new(),
        node_type: "Image",
    }
}
