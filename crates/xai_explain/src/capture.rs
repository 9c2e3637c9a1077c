//! Per-layer activation and gradient capture for image models.

use std::collections::HashMap;

use burn::prelude::*;
use xai_core::{CoreError, Result};

/// Activations and gradients captured from named layers.
///
/// A forward hook stores the layer output with [`LayerCapture::store_activation`];
/// after the backward pass the gradient of the class score w.r.t. that output
/// is stored with [`LayerCapture::store_gradient`].
#[derive(Debug, Clone)]
pub struct LayerCapture<B: Backend> {
    activations: HashMap<String, Tensor<B, 4>>,
    gradients: HashMap<String, Tensor<B, 4>>,
}

impl<B: Backend> LayerCapture<B> {
    /// Create an empty capture.
    pub fn new() -> Self {
        Self {
            activations: HashMap::new(),
            gradients: HashMap::new(),
        }
    }

    /// Store a layer output (batch, channels, h, w).
    pub fn store_activation(&mut self, layer: &str, activation: Tensor<B, 4>) {
        self.activations.insert(layer.to_string(), activation);
    }

    /// Store the gradient w.r.t. a layer output.
    pub fn store_gradient(&mut self, layer: &str, gradient: Tensor<B, 4>) {
        self.gradients.insert(layer.to_string(), gradient);
    }

    /// Activation of `layer`.
    pub fn activation(&self, layer: &str) -> Option<&Tensor<B, 4>> {
        self.activations.get(layer)
    }

    /// Gradient of `layer`.
    pub fn gradient(&self, layer: &str) -> Option<&Tensor<B, 4>> {
        self.gradients.get(layer)
    }

    /// Activation and gradient of `layer`, both required.
    pub fn pair(&self, layer: &str) -> Result<(Tensor<B, 4>, Tensor<B, 4>)> {
        let activation = self
            .activation(layer)
            .ok_or_else(|| CoreError::InvalidInput(format!("no activation captured for '{}'", layer)))?;
        let gradient = self
            .gradient(layer)
            .ok_or_else(|| CoreError::InvalidInput(format!("no gradient captured for '{}'", layer)))?;
        Ok((activation.clone(), gradient.clone()))
    }

    /// Layers with a captured activation, sorted.
    pub fn layers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.activations.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Drop everything captured so far.
    pub fn clear(&mut self) {
        self.activations.clear();
        self.gradients.clear();
    }
}

impl<B: Backend> Default for LayerCapture<B> {
    fn default() -> Self {
        Self::new()
    }
}
