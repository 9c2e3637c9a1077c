//! Grid layout for mosaics of same-shaped images.
//!
//! The column count is chosen so the tiled mosaic is neither too wide nor
//! too narrow. Elongated images count as several square tiles, so a batch of
//! wide images gets more columns (and fewer rows) than a batch of squares.

use serde::{Deserialize, Serialize};
use xai_core::{CoreError, ImageBatch, Result};

/// Default number of square-tile equivalents per extra column.
pub const DEFAULT_TARGET_ELONGATION: usize = 8;
/// Fewest columns used for more than one tile.
pub const MIN_COLUMNS: usize = 2;
/// Most columns ever estimated.
pub const MAX_COLUMNS: usize = 8;

/// Estimate how many images to place on each row.
///
/// # Arguments
///
/// * `n_images` - Batch size
/// * `width`, `height` - Pixel dimensions of a representative image
/// * `target` - Target elongation; how many square tiles span the wide axis
///   before another column is added
///
/// # Returns
///
/// A column count in `[1, MAX_COLUMNS]`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidInput`] if any argument is zero.
///
/// # Example
///
/// ```rust
/// use xai_explain::estimate_num_per_row;
///
/// assert_eq!(estimate_num_per_row(16, 20, 10, 8).unwrap(), 4);
/// assert_eq!(estimate_num_per_row(1, 10, 10, 8).unwrap(), 1);
/// ```
pub fn estimate_num_per_row(n_images: usize, width: u32, height: u32, target: usize) -> Result<usize> {
    if n_images == 0 {
        return Err(CoreError::InvalidInput(
            "cannot lay out an empty batch".to_string(),
        ));
    }
    if width == 0 || height == 0 {
        return Err(CoreError::InvalidInput(format!(
            "image dimensions must be positive, got {}x{}",
            width, height
        )));
    }
    if target == 0 {
        return Err(CoreError::InvalidInput(
            "target elongation must be positive".to_string(),
        ));
    }

    // Integer floor on pixel dimensions, so e >= 1.
    let elongation = (width / height).max(height / width) as usize;
    let n = elongation.saturating_mul(n_images);
    if n == 1 || n_images == 1 {
        return Ok(1);
    }
    Ok(n.div_ceil(target).clamp(MIN_COLUMNS, MAX_COLUMNS))
}

/// Rows and columns of a mosaic, filled row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridLayout {
    rows: usize,
    columns: usize,
}

impl GridLayout {
    /// Layout with a fixed column count for `n_images` tiles.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if `n_images` or `columns` is zero.
    pub fn new(n_images: usize, columns: usize) -> Result<Self> {
        if n_images == 0 {
            return Err(CoreError::InvalidInput(
                "cannot lay out an empty batch".to_string(),
            ));
        }
        if columns == 0 {
            return Err(CoreError::InvalidInput(
                "number of figures per row must be positive".to_string(),
            ));
        }
        Ok(Self {
            rows: n_images.div_ceil(columns),
            columns,
        })
    }

    /// Layout for a batch.
    ///
    /// An explicit `num_per_row` bypasses the estimator; otherwise the
    /// column count is estimated from the first image.
    pub fn for_batch(batch: &ImageBatch, num_per_row: Option<usize>, target: usize) -> Result<Self> {
        let columns = match num_per_row {
            Some(columns) => columns,
            None => {
                let (w, h) = batch.first().dimensions();
                estimate_num_per_row(batch.len(), w, h, target)?
            }
        };
        let layout = Self::new(batch.len(), columns)?;
        tracing::debug!(
            n_images = batch.len(),
            rows = layout.rows,
            columns = layout.columns,
            "Computed grid layout"
        );
        Ok(layout)
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// Total cells, populated or not.
    #[must_use]
    pub const fn n_cells(&self) -> usize {
        self.rows.saturating_mul(self.columns)
    }

    /// `(row, column)` of the tile at `index`.
    #[must_use]
    pub const fn cell(&self, index: usize) -> (usize, usize) {
        (index / self.columns, index % self.columns)
    }

    /// Cells of the first `n_images` tiles, row-major.
    pub fn cells(&self, n_images: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..n_images.min(self.n_cells())).map(move |i| self.cell(i))
    }

    /// Cells left blank at the end of the last row.
    #[must_use]
    pub const fn empty_cells(&self, n_images: usize) -> usize {
        self.n_cells().saturating_sub(n_images)
    }
}
