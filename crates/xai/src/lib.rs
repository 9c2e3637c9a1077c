//! # xai
//!
//! Explainable-AI toolkit pieces in Rust: explanation containers, grid layout
//! and figure backends.
//!
//! - **Core**: images and image batches with optional names
//! - **Explain**: plain image explanations, the grid layout estimator,
//!   Grad-CAM attribution maps
//! - **Plot**: static (raster/SVG) and interactive (plotly JSON/HTML) figures
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use xai::prelude::*;
//!
//! // Load explanation images
//! let batch = ImageBatch::from_dir("heatmaps")?;
//! let mut explanation = PlainExplanation::new();
//! explanation.add_batch(batch);
//!
//! // Static mosaic, layout estimated from the image shape
//! let figure = explanation.plot(&StaticBackend::default(), None)?;
//!
//! // Interactive page with 4 images per row
//! let page = explanation.plot(&InteractiveBackend::default(), Some(4))?;
//!
//! // Exchange as JSON
//! let json = explanation.dump()?;
//! let restored = PlainExplanation::from_json(&json)?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export all crates
pub use xai_core as core;
pub use xai_explain as explain;
pub use xai_plot as plot;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use xai::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use xai_core::{CoreError, Image, ImageBatch, Result};

    // Explain
    pub use xai_explain::{
        estimate_num_per_row, grad_cam, AttributionMap, AttributionMethod, FigureBackend,
        GradCam, GradCamConfig, GridLayout, LayerCapture, Panel, PlainExplanation,
    };

    // Plot
    pub use xai_plot::{InteractiveBackend, InteractiveFigure, PlotConfig, StaticBackend, StaticFigure};
}
