//! Interactive multi-panel figures in plotly's JSON figure format.
//!
//! The figure mirrors what plotly's `make_subplots` builds: one pair of axes
//! per grid cell, one `image` trace per populated cell and one annotation per
//! subplot title. It can be embedded in a dashboard as JSON or written out as
//! a standalone HTML page.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Map, Value};
use xai_core::{CoreError, ImageBatch, Result};
use xai_explain::{panels, FigureBackend, GridLayout, Panel};

use crate::config::PlotConfig;
use crate::{check_grid, escape_xml};

/// Horizontal gap between subplots as a fraction of the figure, split over columns.
const HORIZONTAL_SPACING: f64 = 0.2;
/// Vertical gap between subplots as a fraction of the figure, split over rows.
const VERTICAL_SPACING: f64 = 0.3;

/// Backend producing [`InteractiveFigure`]s.
#[derive(Debug, Clone, Default)]
pub struct InteractiveBackend {
    config: PlotConfig,
}

impl InteractiveBackend {
    /// Create a backend with the given config.
    pub fn new(config: PlotConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &PlotConfig {
        &self.config
    }
}

impl FigureBackend for InteractiveBackend {
    type Figure = InteractiveFigure;

    fn target_elongation(&self) -> usize {
        self.config.target_elongation
    }

    fn render(&self, layout: &GridLayout, batch: &ImageBatch) -> Result<InteractiveFigure> {
        self.config.validate()?;
        check_grid(layout)?;
        let panels = panels(layout, batch)?;
        let (rows, cols) = (layout.rows(), layout.columns());

        let h_space = if cols > 1 { HORIZONTAL_SPACING / cols as f64 } else { 0.0 };
        let v_space = if rows > 1 { VERTICAL_SPACING / rows as f64 } else { 0.0 };
        let cell_w = (1.0 - h_space * (cols - 1) as f64) / cols as f64;
        let cell_h = (1.0 - v_space * (rows - 1) as f64) / rows as f64;
        let x_domain = |c: usize| {
            let x0 = c as f64 * (cell_w + h_space);
            [x0, x0 + cell_w]
        };
        let y_domain = |r: usize| {
            let y1 = 1.0 - r as f64 * (cell_h + v_space);
            [y1 - cell_h, y1]
        };

        let mut fig_layout = Map::new();
        for r in 0..rows {
            for c in 0..cols {
                let k = r * cols + c + 1;
                fig_layout.insert(
                    axis_name("xaxis", k),
                    json!({
                        "domain": x_domain(c),
                        "anchor": axis_name("y", k),
                        "visible": false,
                        "showticklabels": false,
                    }),
                );
                fig_layout.insert(
                    axis_name("yaxis", k),
                    json!({
                        "domain": y_domain(r),
                        "anchor": axis_name("x", k),
                        "visible": false,
                        "showticklabels": false,
                    }),
                );
            }
        }

        let mut data = Vec::with_capacity(panels.len());
        let mut annotations = Vec::new();
        for panel in &panels {
            let k = panel.row * cols + panel.col + 1;
            let png = batch.images()[panel.index].to_png_bytes()?;
            let mut trace = json!({
                "type": "image",
                "source": format!("data:image/png;base64,{}", STANDARD.encode(png)),
                "xaxis": axis_name("x", k),
                "yaxis": axis_name("y", k),
            });
            if let Some(title) = &panel.title {
                trace["name"] = Value::String(title.clone());
                let [x0, x1] = x_domain(panel.col);
                let [_, y1] = y_domain(panel.row);
                annotations.push(json!({
                    "text": title,
                    "x": (x0 + x1) / 2.0,
                    "y": y1,
                    "xref": "paper",
                    "yref": "paper",
                    "xanchor": "center",
                    "yanchor": "bottom",
                    "showarrow": false,
                    "font": { "size": 16 },
                }));
            }
            data.push(trace);
        }

        let height = self.config.row_height as usize * rows;
        fig_layout.insert("height".to_string(), json!(height));
        fig_layout.insert("showlegend".to_string(), json!(false));
        fig_layout.insert("annotations".to_string(), Value::Array(annotations));

        tracing::debug!(rows, cols, height, "Rendered interactive figure");

        Ok(InteractiveFigure {
            layout: *layout,
            panels,
            figure: json!({ "data": data, "layout": Value::Object(fig_layout) }),
            plotly_cdn: self.config.plotly_cdn.clone(),
        })
    }
}

/// Name of the `k`-th axis: `xaxis`, `xaxis2`, ... in the layout and
/// `x`, `x2`, ... in trace references.
fn axis_name(prefix: &str, k: usize) -> String {
    if k == 1 {
        prefix.to_string()
    } else {
        format!("{}{}", prefix, k)
    }
}

/// A rendered interactive figure.
#[derive(Debug, Clone)]
pub struct InteractiveFigure {
    layout: GridLayout,
    panels: Vec<Panel>,
    figure: Value,
    plotly_cdn: String,
}

impl InteractiveFigure {
    /// The grid the figure was rendered with.
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Placement and caption of every image.
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// The plotly figure (`{"data": [...], "layout": {...}}`).
    pub fn figure(&self) -> &Value {
        &self.figure
    }

    /// Total figure height in pixels.
    pub fn height(&self) -> u64 {
        self.figure["layout"]["height"].as_u64().unwrap_or_default()
    }

    /// The figure as a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.figure).map_err(|e| CoreError::SerializationError(e.to_string()))
    }

    /// A standalone HTML page rendering the figure with plotly.js.
    pub fn to_html(&self, title: &str) -> Result<String> {
        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{cdn}"></script>
</head>
<body>
<div id="xai-figure"></div>
<script>
const fig = {json};
Plotly.newPlot("xai-figure", fig.data, fig.layout, {{responsive: true}});
</script>
</body>
</html>
"#,
            title = escape_xml(title),
            cdn = escape_xml(&self.plotly_cdn),
            json = self.to_json()?.replace("</", "<\\/"),
        ))
    }

    /// Write [`InteractiveFigure::to_html`] to `path`.
    pub fn save_html(&self, path: impl AsRef<Path>, title: &str) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_html(title)?)?;
        tracing::info!("Saved interactive figure to {:?}", path);
        Ok(())
    }
}
