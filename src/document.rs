//! # Document
//!
//! The bill as a sequence of blocks, ready for layout: a header grid with
//! the logo and title, the main party/routing grid, the cargo manifest and a
//! footer with freight, issue details, signature and the optional QR code.
//!
//! Every grid here is six columns wide. Field placement is expressed only as
//! column counts; the [`GridAssembler`] turns those into slots, placeholders
//! and span directives and refuses any row that does not add up.

use crate::assets;
use crate::content::{CellContent, ContentBuilder, ImageRole, Paragraph};
use crate::config::PageConfig;
use crate::error::LayoutError;
use crate::grid::{even_fractions, GridAssembler, GridLayout, GroupField, RowItem};
use crate::manifest::CargoManifest;
use crate::model::{BillOfLading, FieldId};
use crate::style::Align;
use crate::Engine;

/// Columns of every fixed grid on the form.
pub const FORM_COLUMNS: usize = 6;

const GOODS_HEADING: &str = "Particulars furnished by the Merchant";

/// How a table column's width is determined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnWidth {
    /// Share of the table width (0.0-1.0).
    Fraction(f64),
    /// Width in points.
    Fixed(f64),
    /// An equal share of whatever the other columns leave.
    Auto,
}

/// Which part of the form a table is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRole {
    Header,
    Main,
    Goods,
    Footer,
}

/// A bordered grid with per-row minimum heights.
#[derive(Debug, Clone, PartialEq)]
pub struct TableBlock {
    pub role: BlockRole,
    pub grid: GridLayout,
    pub columns: Vec<ColumnWidth>,
    /// Minimum height of each row; rows grow to fit their content.
    pub row_heights: Vec<f64>,
    /// Leading rows repeated at the top of every continuation page.
    pub header_rows: usize,
}

impl TableBlock {
    /// A table with equal-width columns and no repeated header.
    pub fn new(role: BlockRole, grid: GridLayout, row_heights: Vec<f64>) -> Self {
        let columns = even_fractions(grid.columns())
            .into_iter()
            .map(ColumnWidth::Fraction)
            .collect();
        Self {
            role,
            grid,
            columns,
            row_heights,
            header_rows: 0,
        }
    }

    pub fn with_columns(mut self, columns: Vec<ColumnWidth>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_header_rows(mut self, header_rows: usize) -> Self {
        self.header_rows = header_rows;
        self
    }

    pub fn min_row_height(&self, row: usize) -> f64 {
        self.row_heights.get(row).copied().unwrap_or(0.0)
    }
}

/// One vertical piece of the document.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Table(TableBlock),
    /// Vertical gap in points.
    Spacer(f64),
    /// A section heading outside any table.
    Heading(Paragraph),
}

/// PDF Info dictionary entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
}

/// A bill of lading laid out as blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub page: PageConfig,
    pub metadata: Metadata,
    pub blocks: Vec<Block>,
    pub tracking_url: Option<String>,
}

impl Document {
    /// Assemble the form for one bill.
    pub fn build(bill: &BillOfLading, engine: &Engine) -> Result<Self, LayoutError> {
        let config = &engine.config;
        let content = ContentBuilder {
            bill,
            styles: &engine.styles,
            captions: &engine.captions,
            placeholder: &config.placeholder,
        };
        let spacer = config.page.margin.top.min(14.4);

        let mut blocks = vec![
            Block::Table(header_block(&content, engine)?),
            Block::Spacer(spacer),
            Block::Table(main_block(&content, engine)?),
            Block::Spacer(spacer),
            Block::Heading(Paragraph::plain(GOODS_HEADING, engine.styles.heading)),
        ];
        blocks.push(Block::Table(CargoManifest::build(
            &bill.cargo,
            &content,
            &config.manifest,
            config.row_heights.label,
        )?));
        blocks.push(Block::Spacer(spacer));
        blocks.push(Block::Table(footer_block(&content, engine)?));

        let bl_number = bill.value(FieldId::BlNumber).map(str::trim);
        Ok(Self {
            page: config.page,
            metadata: Metadata {
                title: Some(match bl_number {
                    Some(no) => format!("Bill of Lading {}", no),
                    None => "Bill of Lading".to_string(),
                }),
                author: Some(config.company_name.clone()),
                subject: bill.value(FieldId::VesselVoyage).map(str::to_string),
                creator: Some(format!("lading {}", env!("CARGO_PKG_VERSION"))),
            },
            blocks,
            tracking_url: bill.tracking_url().map(str::to_string),
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableBlock> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn table(&self, role: BlockRole) -> Option<&TableBlock> {
        self.tables().find(|t| t.role == role)
    }

    pub fn footer(&self) -> Option<&TableBlock> {
        self.table(BlockRole::Footer)
    }

    /// Whether the footer carries a QR code cell.
    pub fn has_qr_code(&self) -> bool {
        self.footer().is_some_and(|t| {
            t.grid
                .cells()
                .any(|c| c.content.image_role() == Some(ImageRole::QrCode))
        })
    }
}

/// Logo, title and the two document numbers.
fn header_block(content: &ContentBuilder, engine: &Engine) -> Result<TableBlock, LayoutError> {
    let styles = content.styles;
    let mut title = Paragraph::plain("BILL OF LADING", styles.title).aligned(Align::Center);
    title.push_break();
    title.push_text(&engine.config.company_name, styles.company);

    let mut grid = GridAssembler::new(FORM_COLUMNS)?;
    grid.push_row(vec![
        RowItem::new(engine.logo().clone(), 2).rows(2),
        RowItem::new(CellContent::Text(title), 2).rows(2),
        RowItem::new(content.composite(FieldId::BlNumber), 2),
    ])?;
    grid.push_row(vec![RowItem::new(content.composite(FieldId::DocumentNo), 2)])?;

    let h = engine.config.row_heights.routing;
    Ok(TableBlock::new(BlockRole::Header, grid.build()?, vec![h, h]))
}

/// Parties, references and routing.
fn main_block(content: &ContentBuilder, engine: &Engine) -> Result<TableBlock, LayoutError> {
    let heights = &engine.config.row_heights;
    let mut grid = GridAssembler::new(FORM_COLUMNS)?;
    let mut rows = Vec::new();

    let mut push = |grid: &mut GridAssembler, items: Vec<(FieldId, usize, usize)>, height: f64| {
        let items = items
            .into_iter()
            .map(|(id, cols, span_rows)| RowItem::new(content.composite(id), cols).rows(span_rows))
            .collect();
        rows.push(height);
        grid.push_row(items)
    };

    push(&mut grid, vec![(FieldId::Shipper, 3, 2), (FieldId::ExportReferences, 3, 1)], heights.routing)?;
    push(&mut grid, vec![(FieldId::ForwardingAgent, 3, 1)], heights.routing)?;
    push(&mut grid, vec![(FieldId::Consignee, 3, 1), (FieldId::Origin, 3, 1)], heights.party)?;
    push(&mut grid, vec![(FieldId::NotifyParty, 3, 2), (FieldId::AlsoNotify, 3, 2)], heights.routing)?;
    push(&mut grid, vec![], heights.routing)?;
    push(
        &mut grid,
        vec![(FieldId::PreCarriage, 2, 1), (FieldId::PlaceOfReceipt, 2, 1), (FieldId::OnwardRouting, 2, 1)],
        heights.routing,
    )?;
    push(
        &mut grid,
        vec![(FieldId::VesselVoyage, 2, 1), (FieldId::PortOfLoading, 2, 1), (FieldId::TypeOfMove, 2, 1)],
        heights.routing,
    )?;
    push(&mut grid, vec![(FieldId::PortOfDischarge, 3, 1), (FieldId::PlaceOfDelivery, 3, 1)], heights.routing)?;

    Ok(TableBlock::new(BlockRole::Main, grid.build()?, rows))
}

/// Freight and issue details, signature and the QR code.
fn footer_block(content: &ContentBuilder, engine: &Engine) -> Result<TableBlock, LayoutError> {
    let config = &engine.config;
    let heights = &config.row_heights;
    let group = |fields: &[(FieldId, usize)]| {
        fields
            .iter()
            .map(|&(id, span)| GroupField {
                label: content.label(id),
                value: content.value(id),
                span,
            })
            .collect::<Vec<_>>()
    };

    let mut grid = GridAssembler::new(FORM_COLUMNS)?;
    let mut rows = Vec::new();

    grid.push_field_group(group(&[
        (FieldId::FreightCharges, 2),
        (FieldId::RevenueTons, 1),
        (FieldId::Rate, 1),
        (FieldId::Prepaid, 1),
        (FieldId::Collect, 1),
    ]))?;
    rows.extend([heights.label, heights.value]);

    grid.push_field_group(group(&[
        (FieldId::DeclaredValue, 2),
        (FieldId::Originals, 1),
        (FieldId::PlaceOfIssue, 1),
        (FieldId::DateOfIssue, 1),
        (FieldId::OnBoardDate, 1),
    ]))?;
    rows.extend([heights.label, heights.value]);

    let signature = content.composite(FieldId::Signature);
    match assets::qr_code(content.bill.tracking_url(), config.qr_size) {
        Some(qr) => {
            grid.push_row(vec![RowItem::new(signature, 4), RowItem::new(qr, 2)])?;
            rows.push(heights.signature.max(config.qr_size + 2.0 * config.cell_padding));
        }
        None => {
            grid.push_row(vec![RowItem::new(signature, FORM_COLUMNS)])?;
            rows.push(heights.signature);
        }
    }

    Ok(TableBlock::new(BlockRole::Footer, grid.build()?, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;

    fn engine() -> Engine {
        Engine::new(LayoutConfig {
            logo_path: None,
            ..LayoutConfig::default()
        })
    }

    fn assert_rows_cover(table: &TableBlock) {
        let grid = &table.grid;
        for r in 0..grid.row_count() {
            assert_eq!(
                grid.span_sum(r) + grid.covered_from_above(r),
                grid.columns(),
                "{:?} row {}",
                table.role,
                r
            );
        }
        assert_eq!(table.row_heights.len(), grid.row_count());
    }

    #[test]
    fn test_every_block_covers_its_grid() {
        let engine = engine();
        let bill = BillOfLading::new().with(FieldId::BlNumber, "MCL-001");
        let doc = Document::build(&bill, &engine).unwrap();
        assert_eq!(doc.tables().count(), 4);
        for table in doc.tables() {
            assert_rows_cover(table);
        }
    }

    #[test]
    fn test_empty_bill_uses_placeholders() {
        let engine = engine();
        let doc = Document::build(&BillOfLading::new(), &engine).unwrap();
        let main = doc.table(BlockRole::Main).unwrap();
        let shipper = main.grid.cells().next().unwrap();
        assert_eq!(shipper.content.plain_text(), "(2) Shipper / Exporter\nN/A");
        assert_eq!(doc.metadata.title.as_deref(), Some("Bill of Lading"));
    }

    #[test]
    fn test_qr_cell_only_with_tracking_url() {
        let engine = engine();
        let mut bill = BillOfLading::new();
        assert!(!Document::build(&bill, &engine).unwrap().has_qr_code());

        bill.tracking_url = Some("   ".to_string());
        assert!(!Document::build(&bill, &engine).unwrap().has_qr_code());

        bill.tracking_url = Some("https://track.example.com/MCL-001".to_string());
        let doc = Document::build(&bill, &engine).unwrap();
        assert!(doc.has_qr_code());
        let footer = doc.footer().unwrap();
        assert_rows_cover(footer);
        let last = footer.grid.row_count() - 1;
        assert_eq!(footer.grid.cells_in_row(last).count(), 2);
        assert!(footer.min_row_height(last) >= engine.config.qr_size);
    }

    #[test]
    fn test_header_spans_logo_and_title() {
        let engine = engine();
        let doc = Document::build(&BillOfLading::new(), &engine).unwrap();
        let header = doc.table(BlockRole::Header).unwrap();
        let directives = header.grid.span_directives();
        assert!(directives.iter().any(|d| d.start == (0, 0) && d.end == (1, 1)));
        assert!(directives.iter().any(|d| d.start == (0, 2) && d.end == (1, 3)));
        let title = header.grid.cells().nth(1).unwrap();
        assert!(title.content.plain_text().starts_with("BILL OF LADING\n"));
    }

    #[test]
    fn test_footer_groups_are_parallel() {
        let engine = engine();
        let bill = BillOfLading::new().with(FieldId::Rate, "12.50");
        let doc = Document::build(&bill, &engine).unwrap();
        let footer = doc.footer().unwrap();
        let spans = |r| footer.grid.cells_in_row(r).map(|c| c.col_span).collect::<Vec<_>>();
        assert_eq!(spans(0), spans(1));
        assert_eq!(spans(2), spans(3));
        let rate_value = footer.grid.cells_in_row(1).nth(2).unwrap();
        assert_eq!(rate_value.content.plain_text(), "12.50");
    }
}
