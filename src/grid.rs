//! # Grid Assembler
//!
//! The form is a rectangular grid of bordered cells, some merged across
//! columns (and occasionally rows). Every row must account for exactly
//! `columns` slots: a real cell covers `col_span` of them, and the slots a
//! span swallows are held by [`Slot::Covered`] placeholders. Get that sum
//! wrong and the table misrenders, so the assembler computes placeholders
//! itself and rejects a bad row the moment it is pushed, naming the row and
//! the expected and actual column totals.
//!
//! Layout definitions only ever say "this field takes N of the grid's
//! columns". Absolute coordinates, including the end-inclusive
//! [`SpanDirective`]s the renderer consumes, are derived here and nowhere else.

use crate::content::CellContent;
use crate::error::LayoutError;

/// A rendered cell anchored at (row, col).
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    pub col_span: usize,
    pub row_span: usize,
    pub content: CellContent,
}

/// One grid position.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Cell(GridCell),
    /// Placeholder for a position consumed by a span.
    Covered,
}

impl Slot {
    pub fn cell(&self) -> Option<&GridCell> {
        match self {
            Slot::Cell(cell) => Some(cell),
            Slot::Covered => None,
        }
    }
}

/// A merged region in absolute, end-inclusive coordinates `(row, col)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanDirective {
    pub start: (usize, usize),
    pub end: (usize, usize),
}

/// A validated rectangular grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    columns: usize,
    rows: Vec<Vec<Slot>>,
}

impl GridLayout {
    /// Validate rows built elsewhere. Cell coordinates are taken from each
    /// cell's position in `rows`.
    pub fn from_slots(columns: usize, mut rows: Vec<Vec<Slot>>) -> Result<Self, LayoutError> {
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, slot) in row.iter_mut().enumerate() {
                if let Slot::Cell(cell) = slot {
                    cell.row = r;
                    cell.col = c;
                }
            }
        }
        validate(columns, &rows)?;
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<Slot>] {
        &self.rows
    }

    /// Real cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &GridCell> {
        self.rows.iter().flatten().filter_map(Slot::cell)
    }

    pub fn cells_in_row(&self, row: usize) -> impl Iterator<Item = &GridCell> {
        self.rows
            .get(row)
            .into_iter()
            .flatten()
            .filter_map(Slot::cell)
    }

    /// Sum of the column spans of the real cells anchored in `row`.
    pub fn span_sum(&self, row: usize) -> usize {
        self.cells_in_row(row).map(|c| c.col_span).sum()
    }

    /// Slots of `row` held by row spans from cells above it.
    pub fn covered_from_above(&self, row: usize) -> usize {
        self.cells()
            .filter(|c| c.row < row && c.row + c.row_span > row)
            .map(|c| c.col_span)
            .sum()
    }

    /// One directive per cell that spans more than a single slot.
    pub fn span_directives(&self) -> Vec<SpanDirective> {
        self.cells()
            .filter(|c| c.col_span > 1 || c.row_span > 1)
            .map(|c| SpanDirective {
                start: (c.row, c.col),
                end: (c.row + c.row_span - 1, c.col + c.col_span - 1),
            })
            .collect()
    }
}

fn validate(columns: usize, rows: &[Vec<Slot>]) -> Result<(), LayoutError> {
    if columns == 0 {
        return Err(LayoutError::NoColumns);
    }
    let mut claimed = vec![vec![false; columns]; rows.len()];

    for (r, row) in rows.iter().enumerate() {
        if row.len() != columns {
            return Err(LayoutError::ColumnMismatch {
                row: r,
                expected: columns,
                actual: row.len(),
            });
        }
        for (c, slot) in row.iter().enumerate() {
            match slot {
                Slot::Covered => {
                    if !claimed[r][c] {
                        return Err(LayoutError::OrphanPlaceholder { row: r, col: c });
                    }
                }
                Slot::Cell(cell) => {
                    if cell.col_span == 0 || cell.row_span == 0 {
                        return Err(LayoutError::ZeroSpan { row: r, col: c });
                    }
                    if c + cell.col_span > columns {
                        return Err(LayoutError::ColumnMismatch {
                            row: r,
                            expected: columns,
                            actual: c + cell.col_span,
                        });
                    }
                    if r + cell.row_span > rows.len() {
                        return Err(LayoutError::RowSpanOverflow {
                            row: r,
                            col: c,
                            span: cell.row_span,
                        });
                    }
                    for rr in r..r + cell.row_span {
                        for cc in c..c + cell.col_span {
                            if claimed[rr][cc] {
                                return Err(LayoutError::SpanConflict { row: rr, col: cc });
                            }
                            claimed[rr][cc] = true;
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// A cell to place in the next row, sized in grid columns.
#[derive(Debug, Clone, PartialEq)]
pub struct RowItem {
    pub content: CellContent,
    pub col_span: usize,
    pub row_span: usize,
}

impl RowItem {
    pub fn new(content: CellContent, col_span: usize) -> Self {
        Self {
            content,
            col_span,
            row_span: 1,
        }
    }

    /// Extend the cell down over `rows` rows in total.
    pub fn rows(mut self, rows: usize) -> Self {
        self.row_span = rows;
        self
    }
}

/// One field of a label/value group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupField {
    pub label: CellContent,
    pub value: CellContent,
    pub span: usize,
}

/// Builds a [`GridLayout`] row by row.
#[derive(Debug, Clone)]
pub struct GridAssembler {
    columns: usize,
    rows: Vec<Vec<Slot>>,
    /// Per column: how many more rows are held by a row span from above.
    carry: Vec<usize>,
}

impl GridAssembler {
    pub fn new(columns: usize) -> Result<Self, LayoutError> {
        if columns == 0 {
            return Err(LayoutError::NoColumns);
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
            carry: vec![0; columns],
        })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Index the next pushed row will get.
    pub fn next_row(&self) -> usize {
        self.rows.len()
    }

    /// Append a row. Slots still held by row spans from above are skipped
    /// automatically; the items must fill the rest exactly.
    pub fn push_row(&mut self, items: Vec<RowItem>) -> Result<usize, LayoutError> {
        let r = self.rows.len();
        let mut c = 0;
        for item in &items {
            while c < self.columns && self.carry[c] > 0 {
                c += 1;
            }
            if item.col_span == 0 || item.row_span == 0 {
                return Err(LayoutError::ZeroSpan {
                    row: r,
                    col: c.min(self.columns - 1),
                });
            }
            c += item.col_span;
        }

        let held = self.carry.iter().filter(|&&n| n > 0).count();
        let declared: usize = items.iter().map(|i| i.col_span).sum();
        if declared + held != self.columns {
            return Err(LayoutError::ColumnMismatch {
                row: r,
                expected: self.columns,
                actual: declared + held,
            });
        }

        let mut row = Vec::with_capacity(self.columns);
        let mut carry = self.carry.clone();
        let mut items = items.into_iter();
        let mut c = 0;
        while c < self.columns {
            if self.carry[c] > 0 {
                row.push(Slot::Covered);
                carry[c] -= 1;
                c += 1;
                continue;
            }
            // The sums match, so an item is always available here.
            let Some(item) = items.next() else {
                return Err(LayoutError::OrphanPlaceholder { row: r, col: c });
            };
            if c + item.col_span > self.columns {
                return Err(LayoutError::ColumnMismatch {
                    row: r,
                    expected: self.columns,
                    actual: c + item.col_span,
                });
            }
            if let Some(cc) = (c..c + item.col_span).find(|&cc| self.carry[cc] > 0) {
                return Err(LayoutError::SpanConflict { row: r, col: cc });
            }
            for cc in c..c + item.col_span {
                carry[cc] = item.row_span - 1;
            }
            row.push(Slot::Cell(GridCell {
                row: r,
                col: c,
                col_span: item.col_span,
                row_span: item.row_span,
                content: item.content,
            }));
            row.extend((1..item.col_span).map(|_| Slot::Covered));
            c += item.col_span;
        }

        self.carry = carry;
        self.rows.push(row);
        Ok(r)
    }

    /// Append a label row and a value row with identical spans. Returns the
    /// two row indices.
    pub fn push_field_group(&mut self, fields: Vec<GroupField>) -> Result<(usize, usize), LayoutError> {
        let (labels, values): (Vec<_>, Vec<_>) = fields
            .into_iter()
            .map(|f| (RowItem::new(f.label, f.span), RowItem::new(f.value, f.span)))
            .unzip();
        let snapshot = (self.rows.len(), self.carry.clone());
        let label_row = self.push_row(labels)?;
        match self.push_row(values) {
            Ok(value_row) => Ok((label_row, value_row)),
            Err(e) => {
                self.rows.truncate(snapshot.0);
                self.carry = snapshot.1;
                Err(e)
            }
        }
    }

    /// Finish the grid. Fails if a row span is still open.
    pub fn build(self) -> Result<GridLayout, LayoutError> {
        if let Some(col) = self.carry.iter().position(|&n| n > 0) {
            let cell = self
                .rows
                .iter()
                .flatten()
                .filter_map(Slot::cell)
                .find(|c| col >= c.col && col < c.col + c.col_span && c.row + c.row_span > self.rows.len());
            let (row, span) = cell.map(|c| (c.row, c.row_span)).unwrap_or((self.rows.len(), 0));
            return Err(LayoutError::RowSpanOverflow { row, col, span });
        }
        GridLayout::from_slots(self.columns, self.rows)
    }
}

/// Column widths as equal fractions of the table width.
pub fn even_fractions(columns: usize) -> Vec<f64> {
    if columns == 0 {
        return Vec::new();
    }
    vec![1.0 / columns as f64; columns]
}
