//! # xai_core
//!
//! Core types shared by the xai-rs explanation crates.
//!
//! This crate provides:
//! - [`Image`], an owned 8-bit pixel buffer convertible to and from the `image` crate
//! - [`ImageBatch`], a non-empty batch of images with optional display names
//! - Error types and common utilities
//!
//! ## Example
//!
//! ```rust
//! use xai_core::{Image, ImageBatch};
//!
//! let tile = Image::filled(32, 32, [200, 30, 30]).unwrap();
//! let batch = ImageBatch::new(vec![tile.clone(), tile], None).unwrap();
//! assert_eq!(batch.len(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod batch;
mod error;
mod raster;

pub use batch::ImageBatch;
pub use error::{CoreError, Result};
pub use raster::Image;
