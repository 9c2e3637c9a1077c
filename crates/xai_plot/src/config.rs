//! Plot configuration shared by the figure backends.

use std::path::Path;

use serde::{Deserialize, Serialize};
use xai_core::{CoreError, Result};
use xai_explain::DEFAULT_TARGET_ELONGATION;

/// Pinned plotly.js bundle used by standalone HTML pages.
pub const DEFAULT_PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Largest accepted `tile_size` and `row_height`, in pixels.
pub const MAX_TILE_SIZE: u32 = 4096;
/// Largest accepted `padding` and `caption_height`, in pixels.
pub const MAX_MARGIN: u32 = 1024;

/// Rendering options for both figure backends.
///
/// Missing fields fall back to their defaults when loaded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Target elongation passed to the layout estimator.
    pub target_elongation: usize,
    /// Side of the square cell each image is fitted into (static figures).
    pub tile_size: u32,
    /// Blank margin around each tile, in pixels.
    pub padding: u32,
    /// Height reserved above each tile for its caption (SVG export).
    pub caption_height: u32,
    /// Canvas background color.
    pub background: [u8; 3],
    /// Height in pixels of one row of an interactive figure.
    pub row_height: u32,
    /// URL of the plotly.js bundle loaded by HTML exports.
    pub plotly_cdn: String,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            target_elongation: DEFAULT_TARGET_ELONGATION,
            tile_size: 224,
            padding: 8,
            caption_height: 24,
            background: [255, 255, 255],
            row_height: 400,
            plotly_cdn: DEFAULT_PLOTLY_CDN.to_string(),
        }
    }
}

impl PlotConfig {
    /// Load a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| CoreError::SerializationError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        tracing::debug!("Loaded plot config from {:?}", path);
        Ok(config)
    }

    /// Save the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::SerializationError(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Check that sizes are usable.
    pub fn validate(&self) -> Result<()> {
        if self.target_elongation == 0 {
            return Err(CoreError::InvalidInput(
                "target_elongation must be positive".to_string(),
            ));
        }
        if self.tile_size == 0 {
            return Err(CoreError::InvalidInput("tile_size must be positive".to_string()));
        }
        if self.row_height == 0 {
            return Err(CoreError::InvalidInput("row_height must be positive".to_string()));
        }
        for (name, value, max) in [
            ("tile_size", self.tile_size, MAX_TILE_SIZE),
            ("row_height", self.row_height, MAX_TILE_SIZE),
            ("padding", self.padding, MAX_MARGIN),
            ("caption_height", self.caption_height, MAX_MARGIN),
        ] {
            if value > max {
                return Err(CoreError::InvalidInput(format!(
                    "{} must be at most {}, got {}",
                    name, max, value
                )));
            }
        }
        Ok(())
    }
}
