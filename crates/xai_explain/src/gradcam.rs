//! Grad-CAM explainer producing plain image explanations.

use burn::prelude::*;
use serde::{Deserialize, Serialize};
use xai_core::{CoreError, ImageBatch, Result};

use crate::attribution::{grad_cam, HeatmapConfig};
use crate::capture::LayerCapture;
use crate::plain::PlainExplanation;

/// Configuration for [`GradCam`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradCamConfig {
    /// Name of the conv layer whose activations are explained.
    pub target_layer: String,
    /// Heatmap coloring and blending.
    #[serde(default)]
    pub heatmap: HeatmapConfig,
    /// Blend heatmaps over the input images instead of returning bare maps.
    #[serde(default = "default_overlay")]
    pub overlay: bool,
}

fn default_overlay() -> bool {
    true
}

impl GradCamConfig {
    /// Config targeting `layer` with default rendering.
    pub fn new(layer: impl Into<String>) -> Self {
        Self {
            target_layer: layer.into(),
            heatmap: HeatmapConfig::default(),
            overlay: default_overlay(),
        }
    }
}

/// Grad-CAM explainer for CNN image classifiers.
///
/// The model itself stays with the caller: run the forward and backward pass,
/// record the target layer in a [`LayerCapture`], then call
/// [`GradCam::explain`].
///
/// # Example
///
/// ```rust,ignore
/// let explainer = GradCam::new("features.18");
/// let explanation = explainer.explain(&images, &capture, &predicted, Some(&class_names))?;
/// explanation.plot(&StaticBackend::default(), None)?;
/// ```
#[derive(Debug, Clone)]
pub struct GradCam {
    config: GradCamConfig,
}

impl GradCam {
    /// Explain the given layer with default settings.
    pub fn new(target_layer: impl Into<String>) -> Self {
        Self::from_config(GradCamConfig::new(target_layer))
    }

    /// Create from config.
    pub fn from_config(config: GradCamConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &GradCamConfig {
        &self.config
    }

    /// Build one heatmap per input image.
    ///
    /// `targets[i]` is the class explained for image `i`; its name (from
    /// `class_names`, or the class index) becomes the image caption.
    pub fn explain<B: Backend>(
        &self,
        inputs: &ImageBatch,
        capture: &LayerCapture<B>,
        targets: &[usize],
        class_names: Option<&[String]>,
    ) -> Result<PlainExplanation> {
        if targets.len() != inputs.len() {
            return Err(CoreError::ShapeMismatch(format!(
                "{} targets for {} images",
                targets.len(),
                inputs.len()
            )));
        }

        let (activations, gradients) = capture.pair(&self.config.target_layer)?;
        let cam = grad_cam(activations, gradients)?;
        let overlay = self.config.overlay.then(|| inputs.images());
        let heatmaps = cam.to_heatmaps(overlay, &self.config.heatmap)?;

        let names = targets
            .iter()
            .map(|&t| match class_names {
                Some(names) => names.get(t).cloned().ok_or_else(|| {
                    CoreError::InvalidInput(format!("class {} has no name", t))
                }),
                None => Ok(t.to_string()),
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            layer = %self.config.target_layer,
            n_images = heatmaps.len(),
            "Computed Grad-CAM heatmaps"
        );

        let mut explanation = PlainExplanation::new();
        explanation.add(heatmaps, Some(names))?;
        Ok(explanation)
    }
}
