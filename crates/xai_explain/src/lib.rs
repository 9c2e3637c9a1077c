//! # xai_explain
//!
//! Explanation containers and explainers for xai-rs.
//!
//! This crate provides:
//! - [`PlainExplanation`], a batch of explanation images with optional names
//! - Grid layout estimation for image mosaics ([`estimate_num_per_row`], [`GridLayout`])
//! - The [`FigureBackend`] trait implemented by plotting backends
//! - Grad-CAM and Input × Gradient attribution maps for CNN image classifiers
//!
//! ## Example
//!
//! ```rust
//! use xai_explain::{estimate_num_per_row, GridLayout};
//!
//! let columns = estimate_num_per_row(40, 10, 10, 8).unwrap();
//! let layout = GridLayout::new(40, columns).unwrap();
//! assert_eq!((layout.rows(), layout.columns()), (8, 5));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod attribution;
mod capture;
mod gradcam;
mod layout;
mod plain;
mod render;

pub use attribution::{
    grad_cam, input_gradient, AttributionMap, AttributionMethod, Colormap, HeatmapConfig,
};
pub use capture::LayerCapture;
pub use gradcam::{GradCam, GradCamConfig};
pub use layout::{
    estimate_num_per_row, GridLayout, DEFAULT_TARGET_ELONGATION, MAX_COLUMNS, MIN_COLUMNS,
};
pub use plain::PlainExplanation;
pub use render::{panels, FigureBackend, Panel};
