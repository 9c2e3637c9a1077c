//! Capability interface implemented by figure backends.

use xai_core::{CoreError, ImageBatch, Result};

use crate::layout::GridLayout;

/// A plotting backend that turns a laid-out image batch into a figure.
///
/// Implementations must place image `i` at `layout.cell(i)`, use the batch
/// names (when present) as captions, hide axis ticks on every cell and leave
/// unused cells blank.
pub trait FigureBackend {
    /// The figure handle produced by this backend.
    type Figure;

    /// Target elongation used when the caller does not fix the columns.
    fn target_elongation(&self) -> usize {
        crate::layout::DEFAULT_TARGET_ELONGATION
    }

    /// Render `batch` into a figure following `layout`.
    fn render(&self, layout: &GridLayout, batch: &ImageBatch) -> Result<Self::Figure>;
}

/// Where a single image landed in a figure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    /// Index of the image in the batch.
    pub index: usize,
    /// Row of the cell.
    pub row: usize,
    /// Column of the cell.
    pub col: usize,
    /// Caption, if the batch has names.
    pub title: Option<String>,
}

/// Panels for every image of `batch` under `layout`.
///
/// # Errors
///
/// Returns [`CoreError::ShapeMismatch`] if the layout has fewer cells than
/// the batch has images.
pub fn panels(layout: &GridLayout, batch: &ImageBatch) -> Result<Vec<Panel>> {
    if layout.n_cells() < batch.len() {
        return Err(CoreError::ShapeMismatch(format!(
            "{}x{} grid cannot hold {} images",
            layout.rows(),
            layout.columns(),
            batch.len()
        )));
    }
    Ok(layout
        .cells(batch.len())
        .enumerate()
        .map(|(index, (row, col))| Panel {
            index,
            row,
            col,
            title: batch.name(index).map(str::to_string),
        })
        .collect())
}
