//! # Cargo Manifest
//!
//! The goods table: one caption row and one row per cargo item. Item rows
//! share a fixed block height, so a short manifest gets tall rows and a long
//! one gets rows no shorter than the configured minimum. The caption row is
//! marked as a header and is repeated when the manifest runs onto another
//! page.

use crate::config::ManifestConfig;
use crate::content::ContentBuilder;
use crate::document::{BlockRole, ColumnWidth, TableBlock};
use crate::error::LayoutError;
use crate::grid::{GridAssembler, RowItem};
use crate::model::{CargoItem, FieldId};

/// Relative widths of the five cargo columns.
const COLUMN_FRACTIONS: [f64; 5] = [0.18, 0.16, 0.38, 0.14, 0.14];

/// Height of each item row: the block height split evenly, but never below
/// `min`. Zero items have no rows, so the height is zero.
pub fn row_height(total: f64, count: usize, min: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    (total / count as f64).max(min)
}

pub struct CargoManifest;

impl CargoManifest {
    /// Build the goods table. `header_height` is the minimum height of the
    /// caption row.
    pub fn build(
        items: &[CargoItem],
        content: &ContentBuilder,
        config: &ManifestConfig,
        header_height: f64,
    ) -> Result<TableBlock, LayoutError> {
        let mut grid = GridAssembler::new(FieldId::CARGO.len())?;
        grid.push_row(
            FieldId::CARGO
                .iter()
                .map(|&id| RowItem::new(content.label(id), 1))
                .collect(),
        )?;

        let height = row_height(config.total_height, items.len(), config.min_row_height);
        let mut row_heights = vec![header_height];
        for item in items {
            grid.push_row(
                FieldId::CARGO
                    .iter()
                    .map(|&id| RowItem::new(content.raw_value(item.column(id)), 1))
                    .collect(),
            )?;
            row_heights.push(height);
        }

        Ok(TableBlock::new(BlockRole::Goods, grid.build()?, row_heights)
            .with_columns(COLUMN_FRACTIONS.iter().copied().map(ColumnWidth::Fraction).collect())
            .with_header_rows(1))
    }
}
