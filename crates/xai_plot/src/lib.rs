//! # xai_plot
//!
//! Figure backends for xai-rs explanations.
//!
//! Two [`FigureBackend`](xai_explain::FigureBackend) implementations are
//! provided and selected explicitly by the caller:
//! - [`StaticBackend`]: a single raster canvas (PNG/JPEG) with an SVG export
//!   that carries captions
//! - [`InteractiveBackend`]: a plotly figure (JSON) with per-image subplot
//!   titles, embeddable in dashboards or saved as standalone HTML
//!
//! Both place images with the same [`GridLayout`](xai_explain::GridLayout),
//! so a batch lands in the same cells whichever backend renders it.
//!
//! ## Example
//!
//! ```rust,ignore
//! use xai_plot::{InteractiveBackend, PlotConfig, StaticBackend};
//!
//! let fig = explanation.plot(&StaticBackend::new(PlotConfig::default()), None)?;
//! let page = explanation.plot(&InteractiveBackend::default(), Some(4))?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod interactive;
mod static_figure;

pub use config::{PlotConfig, DEFAULT_PLOTLY_CDN, MAX_MARGIN, MAX_TILE_SIZE};
pub use interactive::{InteractiveBackend, InteractiveFigure};
pub use static_figure::{StaticBackend, StaticFigure};

use xai_core::{CoreError, Result};
use xai_explain::GridLayout;

/// Largest grid, in cells, either backend renders.
pub const MAX_GRID_CELLS: usize = 10_000;

/// Reject grids too large to render.
pub(crate) fn check_grid(layout: &GridLayout) -> Result<()> {
    if layout.n_cells() > MAX_GRID_CELLS {
        return Err(CoreError::InvalidInput(format!(
            "{}x{} grid exceeds {} cells",
            layout.rows(),
            layout.columns(),
            MAX_GRID_CELLS
        )));
    }
    Ok(())
}

/// Escape text for XML/HTML bodies and attributes.
pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
