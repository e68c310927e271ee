//! Table measurement: column widths, row heights and unbreakable bands.
//!
//! Rows are at least their configured minimum height and grow to fit the
//! tallest single-row cell. A cell spanning several rows that still does
//! not fit stretches the last row it covers. Rows tied together by a row
//! span form a band, and a page break never falls inside a band.

use std::collections::HashMap;
use std::ops::Range;

use crate::content::CellContent;
use crate::document::{ColumnWidth, TableBlock};
use crate::font::FontContext;
use crate::grid::GridCell;
use crate::style::StyleSheet;
use crate::text::{lines_height, wrap_paragraph, TextLine};

/// Resolve column definitions to widths in points.
///
/// Fixed and fractional columns take their share first; `Auto` columns
/// split the rest evenly. When the definitions don't match the grid's
/// column count, every column gets an equal share.
pub fn resolve_column_widths(defs: &[ColumnWidth], columns: usize, available_width: f64) -> Vec<f64> {
    if defs.len() != columns {
        return vec![available_width / columns.max(1) as f64; columns];
    }

    let mut widths = Vec::with_capacity(columns);
    let mut remaining = available_width;
    let mut auto_count = 0;
    for def in defs {
        match *def {
            ColumnWidth::Fixed(w) => {
                widths.push(w);
                remaining -= w;
            }
            ColumnWidth::Fraction(f) => {
                let w = available_width * f;
                widths.push(w);
                remaining -= w;
            }
            ColumnWidth::Auto => {
                widths.push(0.0);
                auto_count += 1;
            }
        }
    }

    if auto_count > 0 {
        let auto_width = (remaining / auto_count as f64).max(0.0);
        for (w, def) in widths.iter_mut().zip(defs) {
            if matches!(def, ColumnWidth::Auto) {
                *w = auto_width;
            }
        }
    }
    widths
}

/// A measured table, ready to be placed.
#[derive(Debug, Clone)]
pub struct TableMetrics {
    pub col_widths: Vec<f64>,
    /// Left edge of each column relative to the table.
    pub col_offsets: Vec<f64>,
    pub row_heights: Vec<f64>,
    /// Wrapped text per cell, keyed by the cell's anchor.
    pub lines: HashMap<(usize, usize), Vec<TextLine>>,
    pub bands: Vec<Range<usize>>,
}

impl TableMetrics {
    pub fn measure(
        table: &TableBlock,
        width: f64,
        fonts: &FontContext,
        styles: &StyleSheet,
    ) -> Self {
        let grid = &table.grid;
        let col_widths = resolve_column_widths(&table.columns, grid.columns(), width);
        let col_offsets = col_widths
            .iter()
            .scan(0.0, |x, w| {
                let left = *x;
                *x += w;
                Some(left)
            })
            .collect();

        let padding = styles.cell_padding;
        let mut lines = HashMap::new();
        let mut needed = HashMap::new();
        for cell in grid.cells() {
            let inner = span_width(&col_widths, cell) - 2.0 * padding;
            let content_height = match &cell.content {
                CellContent::Text(p) => {
                    let wrapped = wrap_paragraph(p, fonts, inner.max(0.0));
                    let h = lines_height(&wrapped);
                    lines.insert((cell.row, cell.col), wrapped);
                    h
                }
                CellContent::Image(img) => img.size.map(|(_, h)| h).unwrap_or(0.0),
                CellContent::Empty => 0.0,
            };
            needed.insert((cell.row, cell.col), content_height + 2.0 * padding);
        }

        let mut row_heights: Vec<f64> = (0..grid.row_count())
            .map(|r| {
                grid.cells_in_row(r)
                    .filter(|c| c.row_span == 1)
                    .map(|c| needed[&(c.row, c.col)])
                    .fold(table.min_row_height(r), f64::max)
            })
            .collect();

        for cell in grid.cells().filter(|c| c.row_span > 1) {
            let rows = cell.row..cell.row + cell.row_span;
            let have: f64 = row_heights[rows.clone()].iter().sum();
            let deficit = needed[&(cell.row, cell.col)] - have;
            if deficit > 0.0 {
                row_heights[rows.end - 1] += deficit;
            }
        }

        Self {
            col_widths,
            col_offsets,
            row_heights,
            lines,
            bands: bands(table),
        }
    }

    pub fn total_width(&self) -> f64 {
        self.col_widths.iter().sum()
    }

    pub fn band_height(&self, band: &Range<usize>) -> f64 {
        self.row_heights[band.clone()].iter().sum()
    }

    /// Height of the header bands plus the first body band: the least that
    /// has to fit for the table to start on a page.
    pub fn lead_height(&self, header_rows: usize) -> f64 {
        let headers = self.bands.iter().take_while(|b| b.start < header_rows).count();
        self.bands[..(headers + 1).min(self.bands.len())]
            .iter()
            .map(|b| self.band_height(b))
            .sum()
    }

    pub fn span_width(&self, cell: &GridCell) -> f64 {
        span_width(&self.col_widths, cell)
    }

    pub fn span_height(&self, cell: &GridCell) -> f64 {
        self.row_heights[cell.row..cell.row + cell.row_span].iter().sum()
    }
}

fn span_width(col_widths: &[f64], cell: &GridCell) -> f64 {
    col_widths[cell.col..cell.col + cell.col_span].iter().sum()
}

/// Group rows into ranges that row spans tie together.
fn bands(table: &TableBlock) -> Vec<Range<usize>> {
    let grid = &table.grid;
    let mut bands = Vec::new();
    let mut start = 0;
    while start < grid.row_count() {
        let mut end = start + 1;
        let mut r = start;
        while r < end {
            for cell in grid.cells_in_row(r) {
                end = end.max(cell.row + cell.row_span);
            }
            r += 1;
        }
        // header rows never share a band with the body
        if start < table.header_rows {
            end = end.max(table.header_rows);
        }
        bands.push(start..end);
        start = end;
    }
    bands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Paragraph;
    use crate::document::BlockRole;
    use crate::grid::{GridAssembler, RowItem};

    fn text(s: &str) -> CellContent {
        CellContent::Text(Paragraph::plain(s, StyleSheet::default().value))
    }

    #[test]
    fn test_fraction_fixed_auto() {
        let widths = resolve_column_widths(
            &[ColumnWidth::Fraction(0.5), ColumnWidth::Fixed(50.0), ColumnWidth::Auto],
            3,
            400.0,
        );
        assert_eq!(widths, vec![200.0, 50.0, 150.0]);
    }

    #[test]
    fn test_mismatched_defs_are_even() {
        assert_eq!(resolve_column_widths(&[ColumnWidth::Auto], 4, 400.0), vec![100.0; 4]);
    }

    #[test]
    fn test_rows_grow_to_fit_text() {
        let mut asm = GridAssembler::new(2).unwrap();
        asm.push_row(vec![RowItem::new(text("a\nb\nc\nd\ne"), 1), RowItem::new(text("x"), 1)])
            .unwrap();
        asm.push_row(vec![RowItem::new(text("y"), 2)]).unwrap();
        let table = TableBlock::new(BlockRole::Main, asm.build().unwrap(), vec![10.0, 40.0]);
        let styles = StyleSheet::default();
        let m = TableMetrics::measure(&table, 200.0, &FontContext::new(), &styles);
        let five_lines = 5.0 * styles.value.leading + 2.0 * styles.cell_padding;
        assert!((m.row_heights[0] - five_lines).abs() < 1e-9);
        assert_eq!(m.row_heights[1], 40.0);
        assert_eq!(m.lines[&(0, 0)].len(), 5);
        assert_eq!(m.col_offsets, vec![0.0, 100.0]);
    }

    #[test]
    fn test_row_span_stretches_last_row_and_forms_band() {
        let mut asm = GridAssembler::new(2).unwrap();
        asm.push_row(vec![RowItem::new(text("1\n2\n3\n4\n5\n6"), 1).rows(2), RowItem::new(text("a"), 1)])
            .unwrap();
        asm.push_row(vec![RowItem::new(text("b"), 1)]).unwrap();
        asm.push_row(vec![RowItem::new(text("c"), 2)]).unwrap();
        let table = TableBlock::new(BlockRole::Main, asm.build().unwrap(), vec![12.0, 12.0, 12.0]);
        let styles = StyleSheet::default();
        let m = TableMetrics::measure(&table, 200.0, &FontContext::new(), &styles);

        let needed = 6.0 * styles.value.leading + 2.0 * styles.cell_padding;
        let first = m.row_heights[0];
        assert!((first + m.row_heights[1] - needed).abs() < 1e-9);
        assert!(m.row_heights[1] > m.row_heights[0]);
        assert_eq!(m.bands, vec![0..2, 2..3]);
        assert!((m.band_height(&(0..2)) - needed).abs() < 1e-9);
    }
}
