//! Static multi-panel figures.
//!
//! Images are fitted into square tiles on a single raster canvas. Captions
//! need a font, so they are kept as panel metadata and drawn only by the SVG
//! export.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{imageops, Rgb, RgbImage};
use xai_core::{CoreError, Image, ImageBatch, Result};
use xai_explain::{panels, FigureBackend, GridLayout, Panel};

use crate::config::PlotConfig;
use crate::{check_grid, escape_xml};

/// Largest canvas, in pixels, a static figure allocates.
const MAX_CANVAS_PIXELS: u64 = 1 << 28;

/// Backend producing [`StaticFigure`]s.
#[derive(Debug, Clone, Default)]
pub struct StaticBackend {
    config: PlotConfig,
}

impl StaticBackend {
    /// Create a backend with the given config.
    pub fn new(config: PlotConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &PlotConfig {
        &self.config
    }
}

impl FigureBackend for StaticBackend {
    type Figure = StaticFigure;

    fn target_elongation(&self) -> usize {
        self.config.target_elongation
    }

    fn render(&self, layout: &GridLayout, batch: &ImageBatch) -> Result<StaticFigure> {
        self.config.validate()?;
        check_grid(layout)?;
        let panels = panels(layout, batch)?;
        let geometry = Geometry::new(&self.config);
        let (width, height) = geometry.canvas_size(layout)?;

        let mut canvas = RgbImage::from_pixel(width, height, Rgb(self.config.background));

        let mut tiles = Vec::with_capacity(panels.len());
        for panel in &panels {
            let tile = fit(&batch.images()[panel.index], self.config.tile_size)?;
            let (x, y) = geometry.tile_origin(panel, &tile);
            let rgb = tile.to_dynamic()?.to_rgb8();
            imageops::overlay(&mut canvas, &rgb, i64::from(x), i64::from(y));
            tiles.push(tile);
        }

        tracing::debug!(
            rows = layout.rows(),
            columns = layout.columns(),
            width = canvas.width(),
            height = canvas.height(),
            "Rendered static figure"
        );

        Ok(StaticFigure {
            layout: *layout,
            panels,
            tiles,
            canvas,
            geometry,
            background: self.config.background,
        })
    }
}

/// Pixel geometry of one grid cell.
#[derive(Debug, Clone, Copy)]
struct Geometry {
    tile_size: u32,
    padding: u32,
    caption_height: u32,
    cell_width: u32,
    cell_height: u32,
}

impl Geometry {
    fn new(config: &PlotConfig) -> Self {
        Self {
            tile_size: config.tile_size,
            padding: config.padding,
            caption_height: config.caption_height,
            cell_width: config.tile_size + 2 * config.padding,
            cell_height: config.caption_height + config.tile_size + 2 * config.padding,
        }
    }

    /// Canvas size for `layout`, rejecting grids that do not fit.
    fn canvas_size(&self, layout: &GridLayout) -> Result<(u32, u32)> {
        let too_large = || {
            CoreError::InvalidInput(format!(
                "{}x{} grid of {}x{} cells is too large to render",
                layout.rows(),
                layout.columns(),
                self.cell_width,
                self.cell_height
            ))
        };
        let columns = u32::try_from(layout.columns()).map_err(|_| too_large())?;
        let rows = u32::try_from(layout.rows()).map_err(|_| too_large())?;
        let width = self.cell_width.checked_mul(columns).ok_or_else(too_large)?;
        let height = self.cell_height.checked_mul(rows).ok_or_else(too_large)?;
        if u64::from(width) * u64::from(height) > MAX_CANVAS_PIXELS {
            return Err(too_large());
        }
        Ok((width, height))
    }

    /// Top-left corner of `tile` centered in the tile area of `panel`'s cell.
    fn tile_origin(&self, panel: &Panel, tile: &Image) -> (u32, u32) {
        let (w, h) = tile.dimensions();
        let x = panel.col as u32 * self.cell_width + self.padding + (self.tile_size - w) / 2;
        let y = panel.row as u32 * self.cell_height
            + self.caption_height
            + self.padding
            + (self.tile_size - h) / 2;
        (x, y)
    }
}

/// Resize `image` to fit a `size x size` square, keeping its aspect ratio.
fn fit(image: &Image, size: u32) -> Result<Image> {
    let side = f64::from(size);
    let ratio = image.aspect_ratio();
    let (fw, fh) = if ratio >= 1.0 {
        (side, side / ratio)
    } else {
        (side * ratio, side)
    };
    let fw = (fw.round() as u32).clamp(1, size);
    let fh = (fh.round() as u32).clamp(1, size);
    if (fw, fh) == image.dimensions() {
        Ok(image.clone())
    } else {
        image.resize(fw, fh)
    }
}

/// A rendered static figure.
#[derive(Debug, Clone)]
pub struct StaticFigure {
    layout: GridLayout,
    panels: Vec<Panel>,
    tiles: Vec<Image>,
    canvas: RgbImage,
    geometry: Geometry,
    background: [u8; 3],
}

impl StaticFigure {
    /// The grid the figure was rendered with.
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Placement and caption of every image.
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// The raster canvas.
    pub fn canvas(&self) -> &RgbImage {
        &self.canvas
    }

    /// Canvas size in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    /// Render as SVG with captions above each tile.
    pub fn to_svg(&self) -> Result<String> {
        let (width, height) = self.dimensions();
        let [r, g, b] = self.background;
        let mut svg = String::new();

        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}">"#,
            w = width,
            h = height
        ));
        svg.push_str(&format!(
            r#"<rect width="{}" height="{}" fill="rgb({},{},{})"/>"#,
            width, height, r, g, b
        ));

        for (panel, tile) in self.panels.iter().zip(&self.tiles) {
            let (x, y) = self.geometry.tile_origin(panel, tile);
            let (w, h) = tile.dimensions();
            svg.push_str(&format!(
                r#"<image x="{}" y="{}" width="{}" height="{}" href="data:image/png;base64,{}"/>"#,
                x,
                y,
                w,
                h,
                STANDARD.encode(tile.to_png_bytes()?)
            ));

            if let Some(title) = &panel.title {
                let cx = panel.col as u32 * self.geometry.cell_width + self.geometry.cell_width / 2;
                let cy = panel.row as u32 * self.geometry.cell_height + self.geometry.caption_height;
                svg.push_str(&format!(
                    r##"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="14" fill="#2c3e50">{}</text>"##,
                    cx,
                    cy,
                    escape_xml(title)
                ));
            }
        }

        svg.push_str("</svg>");
        Ok(svg)
    }

    /// Save the figure; `.svg` paths get the SVG export, anything else is
    /// encoded by the `image` crate based on the extension.
    ///
    /// Raster output carries no captions, only the blank band reserved for
    /// them; names appear in the SVG export.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let is_svg = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("svg"))
            .unwrap_or(false);
        if is_svg {
            std::fs::write(path, self.to_svg()?)?;
        } else {
            self.canvas.save(path)?;
        }
        tracing::info!("Saved figure to {:?}", path);
        Ok(())
    }
}
