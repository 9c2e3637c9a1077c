//! Attribution map computation for image classifiers.

use burn::prelude::*;
use serde::{Deserialize, Serialize};
use xai_core::{CoreError, Image, Result};

/// Method for computing attribution maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributionMethod {
    /// Gradient-weighted Class Activation Mapping.
    GradCAM,
    /// Input × Gradient.
    InputGradient,
}

/// Attribution map over images, shape (batch, height, width).
#[derive(Debug, Clone)]
pub struct AttributionMap<B: Backend> {
    /// The attribution values.
    pub values: Tensor<B, 3>,
    /// The method used.
    pub method: AttributionMethod,
    /// Target class (for classification).
    pub target_class: Option<usize>,
}

impl<B: Backend> AttributionMap<B> {
    /// Create a new attribution map.
    pub fn new(values: Tensor<B, 3>, method: AttributionMethod) -> Self {
        Self {
            values,
            method,
            target_class: None,
        }
    }

    /// Set the target class.
    pub fn with_target_class(mut self, class: usize) -> Self {
        self.target_class = Some(class);
        self
    }

    /// Get the shape of the attribution map.
    pub fn shape(&self) -> [usize; 3] {
        self.values.dims()
    }

    /// Normalize the attribution values to [0, 1] over the whole batch.
    pub fn normalize(&self) -> Self {
        let min_val: f32 = self.values.clone().min().into_scalar().elem();
        let max_val: f32 = self.values.clone().max().into_scalar().elem();
        let range = max_val - min_val;

        let normalized = if range > 1e-8 {
            (self.values.clone() - min_val) / range
        } else {
            self.values.clone()
        };

        Self {
            values: normalized,
            method: self.method,
            target_class: self.target_class,
        }
    }

    /// Per-sample attribution values, each of length `height * width`.
    pub fn to_rows(&self) -> Result<Vec<Vec<f32>>> {
        let [batch, h, w] = self.shape();
        if h == 0 || w == 0 {
            return Err(CoreError::InvalidInput(format!(
                "attribution map has empty spatial size {}x{}",
                h, w
            )));
        }
        let flat: Vec<f32> = self
            .values
            .clone()
            .into_data()
            .to_vec()
            .map_err(|e| CoreError::Other(format!("attribution readback failed: {:?}", e)))?;
        Ok(flat.chunks(h * w).take(batch).map(<[f32]>::to_vec).collect())
    }

    /// Render each sample as a colored heatmap image.
    ///
    /// Values are rescaled to [0, 1] per sample. When `inputs` is given the
    /// heatmaps are resized to each input and blended over it with
    /// `config.alpha`.
    pub fn to_heatmaps(&self, inputs: Option<&[Image]>, config: &HeatmapConfig) -> Result<Vec<Image>> {
        let [batch, h, w] = self.shape();
        if let Some(inputs) = inputs {
            if inputs.len() != batch {
                return Err(CoreError::ShapeMismatch(format!(
                    "{} attribution maps for {} input images",
                    batch,
                    inputs.len()
                )));
            }
        }

        let mut heatmaps = Vec::with_capacity(batch);
        for (i, row) in self.to_rows()?.iter().enumerate() {
            let min = row.iter().copied().fold(f32::INFINITY, f32::min);
            let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let range = max - min;

            let mut data = Vec::with_capacity(row.len() * 3);
            for &v in row {
                let t = if range > 1e-8 { (v - min) / range } else { 0.0 };
                data.extend_from_slice(&config.colormap.apply(t));
            }
            let heat = Image::new(w as u32, h as u32, 3, data)?;

            let heat = match inputs {
                Some(inputs) => blend(&inputs[i], &heat, config.alpha)?,
                None => heat,
            };
            heatmaps.push(heat);
        }
        Ok(heatmaps)
    }
}

/// Blend `overlay` on top of `base` after resizing it to `base`.
fn blend(base: &Image, overlay: &Image, alpha: f32) -> Result<Image> {
    let (w, h) = base.dimensions();
    let overlay = if overlay.dimensions() == (w, h) {
        overlay.clone()
    } else {
        overlay.resize(w, h)?
    };
    let alpha = alpha.clamp(0.0, 1.0);

    let mut data = Vec::with_capacity(w as usize * h as usize * 3);
    for y in 0..h {
        for x in 0..w {
            let (Some(b), Some(o)) = (base.rgb_at(x, y), overlay.rgb_at(x, y)) else {
                continue;
            };
            for c in 0..3 {
                let v = (1.0 - alpha) * f32::from(b[c]) + alpha * f32::from(o[c]);
                data.push(v.round().clamp(0.0, 255.0) as u8);
            }
        }
    }
    Image::new(w, h, 3, data)
}

/// Color scale used for heatmaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    /// Blue → cyan → yellow → red.
    #[default]
    Jet,
    /// Black → white.
    Gray,
}

impl Colormap {
    /// Map `t` in [0, 1] to an RGB color.
    pub fn apply(self, t: f32) -> [u8; 3] {
        let t = t.clamp(0.0, 1.0);
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        match self {
            Colormap::Jet => [
                to_u8(1.5 - (4.0 * t - 3.0).abs()),
                to_u8(1.5 - (4.0 * t - 2.0).abs()),
                to_u8(1.5 - (4.0 * t - 1.0).abs()),
            ],
            Colormap::Gray => [to_u8(t); 3],
        }
    }
}

/// Heatmap rendering options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    /// Color scale.
    pub colormap: Colormap,
    /// Heatmap weight when blended over the input image.
    pub alpha: f32,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            colormap: Colormap::Jet,
            alpha: 0.5,
        }
    }
}

/// Compute GradCAM attribution for CNN models.
///
/// # Arguments
///
/// * `activations` - Activations of the target conv layer (batch, channels, h, w)
/// * `gradients` - Gradients of the class score w.r.t. those activations
///
/// # Returns
///
/// Attribution map of shape (batch, h, w).
pub fn grad_cam<B: Backend>(
    activations: Tensor<B, 4>,
    gradients: Tensor<B, 4>,
) -> Result<AttributionMap<B>> {
    let dims = activations.dims();
    if gradients.dims() != dims {
        return Err(CoreError::ShapeMismatch(format!(
            "activations {:?} != gradients {:?}",
            dims,
            gradients.dims()
        )));
    }
    let [batch, _channels, h, w] = dims;

    // Global average pool the gradients: (batch, channels, h, w) -> (batch, channels, 1, 1)
    let weights = gradients.mean_dim(3).mean_dim(2);

    // Weighted sum over channels: -> (batch, 1, h, w)
    let cam = (activations * weights).sum_dim(1);

    // ReLU
    let cam = cam.clamp_min(0.0).reshape([batch, h, w]);

    Ok(AttributionMap::new(cam, AttributionMethod::GradCAM))
}

/// Compute Input × Gradient attribution, summed over color channels.
///
/// # Arguments
///
/// * `input` - Model input (batch, channels, h, w)
/// * `gradients` - Gradients w.r.t. input (batch, channels, h, w)
///
/// # Returns
///
/// Attribution map of shape (batch, h, w).
pub fn input_gradient<B: Backend>(
    input: Tensor<B, 4>,
    gradients: Tensor<B, 4>,
) -> Result<AttributionMap<B>> {
    let dims = input.dims();
    if gradients.dims() != dims {
        return Err(CoreError::ShapeMismatch(format!(
            "input {:?} != gradients {:?}",
            dims,
            gradients.dims()
        )));
    }
    let [batch, _channels, h, w] = dims;
    let attribution = (input * gradients).abs().sum_dim(1).reshape([batch, h, w]);
    Ok(AttributionMap::new(attribution, AttributionMethod::InputGradient))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_attribution_map_with_target_class() {
        let device = Default::default();
        let values = Tensor::<TestBackend, 3>::zeros([2, 4, 4], &device);
        let map = AttributionMap::new(values, AttributionMethod::GradCAM).with_target_class(5);

        assert_eq!(map.shape(), [2, 4, 4]);
        assert_eq!(map.target_class, Some(5));
    }

    #[test]
    fn test_attribution_map_normalize() {
        let device = Default::default();
        let data: Vec<f32> = (0..32).map(|i| i as f32 / 3.0).collect();
        let values = Tensor::<TestBackend, 1>::from_floats(data.as_slice(), &device).reshape([2, 4, 4]);
        let map = AttributionMap::new(values, AttributionMethod::InputGradient);

        let norm_vals = map.normalize().values;
        let min: f32 = norm_vals.clone().min().into_scalar().elem();
        let max: f32 = norm_vals.max().into_scalar().elem();

        assert!(min >= 0.0 - 1e-6);
        assert!(max <= 1.0 + 1e-6);
    }

    #[test]
    fn test_grad_cam_shape() {
        let device = Default::default();
        let activations = Tensor::<TestBackend, 4>::ones([2, 16, 7, 5], &device);
        let gradients = Tensor::<TestBackend, 4>::ones([2, 16, 7, 5], &device);

        let cam = grad_cam(activations, gradients).unwrap();

        assert_eq!(cam.shape(), [2, 7, 5]);
        assert_eq!(cam.method, AttributionMethod::GradCAM);
    }

    #[test]
    fn test_grad_cam_relu() {
        let device = Default::default();
        let activations = Tensor::<TestBackend, 4>::ones([1, 2, 3, 3], &device);
        let gradients = Tensor::<TestBackend, 4>::ones([1, 2, 3, 3], &device) * -1.0;

        let cam = grad_cam(activations, gradients).unwrap();
        let max: f32 = cam.values.max().into_scalar().elem();
        assert_eq!(max, 0.0);
    }

    #[test]
    fn test_grad_cam_shape_mismatch() {
        let device = Default::default();
        let activations = Tensor::<TestBackend, 4>::ones([1, 2, 3, 3], &device);
        let gradients = Tensor::<TestBackend, 4>::ones([1, 2, 3, 4], &device);
        assert!(grad_cam(activations, gradients).is_err());
    }

    #[test]
    fn test_input_gradient() {
        let device = Default::default();
        let input = Tensor::<TestBackend, 4>::ones([2, 3, 4, 4], &device);
        let gradients = Tensor::<TestBackend, 4>::ones([2, 3, 4, 4], &device) * 2.0;

        let attr = input_gradient(input, gradients).unwrap();
        assert_eq!(attr.shape(), [2, 4, 4]);
        let max: f32 = attr.values.max().into_scalar().elem();
        assert!((max - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_to_heatmaps() {
        let device = Default::default();
        let data: Vec<f32> = (0..18).map(|i| i as f32).collect();
        let values = Tensor::<TestBackend, 1>::from_floats(data.as_slice(), &device).reshape([2, 3, 3]);
        let map = AttributionMap::new(values, AttributionMethod::GradCAM);

        let heatmaps = map.to_heatmaps(None, &HeatmapConfig::default()).unwrap();
        assert_eq!(heatmaps.len(), 2);
        assert_eq!(heatmaps[0].dimensions(), (3, 3));
        // Lowest value maps to the cold end, highest to the hot end.
        assert_eq!(heatmaps[0].rgb_at(0, 0), Some(Colormap::Jet.apply(0.0)));
        assert_eq!(heatmaps[1].rgb_at(2, 2), Some(Colormap::Jet.apply(1.0)));
    }

    #[test]
    fn test_to_heatmaps_overlay() {
        let device = Default::default();
        let values = Tensor::<TestBackend, 3>::zeros([1, 2, 2], &device);
        let map = AttributionMap::new(values, AttributionMethod::GradCAM);
        let input = Image::filled(8, 6, [0, 0, 0]).unwrap();
        let config = HeatmapConfig {
            colormap: Colormap::Gray,
            alpha: 1.0,
        };

        let out = map.to_heatmaps(Some(&[input]), &config).unwrap();
        assert_eq!(out[0].dimensions(), (8, 6));
        assert_eq!(out[0].rgb_at(3, 3), Some([0, 0, 0]));
    }

    #[test]
    fn test_to_heatmaps_input_count() {
        let device = Default::default();
        let values = Tensor::<TestBackend, 3>::zeros([2, 2, 2], &device);
        let map = AttributionMap::new(values, AttributionMethod::GradCAM);
        let input = Image::filled(2, 2, [0, 0, 0]).unwrap();
        assert!(map.to_heatmaps(Some(&[input]), &HeatmapConfig::default()).is_err());
    }

    #[test]
    fn test_to_heatmaps_rejects_empty_maps() {
        let device = Default::default();
        let values = Tensor::<TestBackend, 3>::zeros([1, 0, 3], &device);
        let map = AttributionMap::new(values, AttributionMethod::GradCAM);
        assert!(matches!(
            map.to_heatmaps(None, &HeatmapConfig::default()),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_colormap_endpoints() {
        assert_eq!(Colormap::Jet.apply(0.0), [0, 0, 128]);
        assert_eq!(Colormap::Jet.apply(1.0), [128, 0, 0]);
        assert_eq!(Colormap::Gray.apply(1.0), [255, 255, 255]);
    }
}
