//! Plain image explanations for vision tasks.
//!
//! A plain explanation is a batch of images (saliency overlays, counterfactual
//! images, ...) with optional names. Each image is one explanation.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use xai_core::{CoreError, Image, ImageBatch, Result};

use crate::layout::{estimate_num_per_row, GridLayout, DEFAULT_TARGET_ELONGATION};
use crate::render::FigureBackend;

/// Tag written into exported explanations.
const KIND: &str = "plain";

/// Container for plain image explanations.
///
/// # Example
///
/// ```rust
/// use xai_core::Image;
/// use xai_explain::PlainExplanation;
///
/// let mut exp = PlainExplanation::new();
/// let tile = Image::filled(10, 10, [0, 128, 255]).unwrap();
/// exp.add(vec![tile; 8], None).unwrap();
///
/// let layout = exp.layout(None).unwrap().unwrap();
/// assert_eq!((layout.rows(), layout.columns()), (4, 2));
///
/// let json = exp.dump().unwrap();
/// let back = PlainExplanation::from_json(&json).unwrap();
/// assert_eq!(back.dump().unwrap(), json);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawExplanation")]
pub struct PlainExplanation {
    kind: String,
    explanations: Option<ImageBatch>,
}

#[derive(Deserialize)]
struct RawExplanation {
    kind: String,
    explanations: Option<ImageBatch>,
}

impl TryFrom<RawExplanation> for PlainExplanation {
    type Error = CoreError;

    fn try_from(raw: RawExplanation) -> Result<Self> {
        if raw.kind != KIND {
            return Err(CoreError::SerializationError(format!(
                "expected a '{}' explanation, found '{}'",
                KIND, raw.kind
            )));
        }
        Ok(Self {
            kind: raw.kind,
            explanations: raw.explanations,
        })
    }
}

impl PlainExplanation {
    /// Create an empty explanation.
    pub fn new() -> Self {
        Self {
            kind: KIND.to_string(),
            explanations: None,
        }
    }

    /// Store a batch of images, replacing anything stored before.
    ///
    /// # Errors
    ///
    /// Fails if `images` is empty or `names` has a different length.
    pub fn add(&mut self, images: Vec<Image>, names: Option<Vec<String>>) -> Result<()> {
        self.explanations = Some(ImageBatch::new(images, names)?);
        Ok(())
    }

    /// Store an already validated batch.
    pub fn add_batch(&mut self, batch: ImageBatch) {
        self.explanations = Some(batch);
    }

    /// The stored explanations, if any.
    pub fn get_explanations(&self) -> Option<&ImageBatch> {
        self.explanations.as_ref()
    }

    /// True when nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.explanations.is_none()
    }

    /// Estimated number of images per row for the stored batch.
    pub fn estimate_num_per_row(&self, target: usize) -> Result<usize> {
        let batch = self.require_batch()?;
        let (w, h) = batch.first().dimensions();
        estimate_num_per_row(batch.len(), w, h, target)
    }

    /// Grid layout for the stored batch, or `None` when empty.
    ///
    /// `num_per_row` overrides the estimated column count.
    pub fn layout(&self, num_per_row: Option<usize>) -> Result<Option<GridLayout>> {
        self.explanations
            .as_ref()
            .map(|batch| GridLayout::for_batch(batch, num_per_row, DEFAULT_TARGET_ELONGATION))
            .transpose()
    }

    /// Plot the stored images with `backend`.
    ///
    /// Returns `Ok(None)` when the explanation is empty.
    pub fn plot<R: FigureBackend>(
        &self,
        backend: &R,
        num_per_row: Option<usize>,
    ) -> Result<Option<R::Figure>> {
        let Some(batch) = &self.explanations else {
            return Ok(None);
        };
        let layout = GridLayout::for_batch(batch, num_per_row, backend.target_elongation())?;
        backend.render(&layout, batch).map(Some)
    }

    /// Export as JSON.
    pub fn dump(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CoreError::SerializationError(e.to_string()))
    }

    /// Import from JSON produced by [`PlainExplanation::dump`].
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::SerializationError(e.to_string()))
    }

    /// Write the JSON export to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.dump()?)?;
        tracing::info!("Saved plain explanation to {:?}", path);
        Ok(())
    }

    /// Read an explanation saved with [`PlainExplanation::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn require_batch(&self) -> Result<&ImageBatch> {
        self.explanations
            .as_ref()
            .ok_or_else(|| CoreError::InvalidInput("explanation has no images".to_string()))
    }
}

impl Default for PlainExplanation {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlainExplanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.explanations {
            Some(batch) => write!(f, "{}", batch),
            None => write!(f, "None"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{panels, Panel};

    fn images(n: usize) -> Vec<Image> {
        (0..n)
            .map(|i| Image::filled(10, 10, [i as u8 * 20, 0, 0]).unwrap())
            .collect()
    }

    struct PanelBackend;

    impl FigureBackend for PanelBackend {
        type Figure = Vec<Panel>;

        fn render(&self, layout: &GridLayout, batch: &ImageBatch) -> Result<Vec<Panel>> {
            panels(layout, batch)
        }
    }

    #[test]
    fn test_new_is_empty() {
        let exp = PlainExplanation::new();
        assert!(exp.is_empty());
        assert!(exp.get_explanations().is_none());
        assert_eq!(exp.to_string(), "None");
        assert!(exp.layout(None).unwrap().is_none());
    }

    #[test]
    fn test_add_replaces() {
        let mut exp = PlainExplanation::new();
        exp.add(images(2), None).unwrap();
        exp.add(images(5), None).unwrap();
        assert_eq!(exp.get_explanations().unwrap().len(), 5);
    }

    #[test]
    fn test_add_rejects_bad_names() {
        let mut exp = PlainExplanation::new();
        assert!(exp.add(images(2), Some(vec!["a".into()])).is_err());
        assert!(exp.is_empty());
    }

    #[test]
    fn test_estimate_requires_images() {
        let exp = PlainExplanation::new();
        assert!(matches!(
            exp.estimate_num_per_row(8),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_plot_empty_returns_none() {
        let exp = PlainExplanation::new();
        assert!(exp.plot(&PanelBackend, None).unwrap().is_none());
    }

    #[test]
    fn test_plot_with_override() {
        let mut exp = PlainExplanation::new();
        exp.add(images(5), None).unwrap();
        let panels = exp.plot(&PanelBackend, Some(3)).unwrap().unwrap();
        assert_eq!((panels[4].row, panels[4].col), (1, 1));
    }

    #[test]
    fn test_round_trip_identity() {
        let mut exp = PlainExplanation::new();
        let names = vec!["dog".to_string(), "cat".to_string(), "camera".to_string()];
        exp.add(images(3), Some(names)).unwrap();

        let first = exp.dump().unwrap();
        let restored = PlainExplanation::from_json(&first).unwrap();
        assert_eq!(restored, exp);
        assert_eq!(restored.dump().unwrap(), first);
    }

    #[test]
    fn test_empty_round_trip() {
        let json = PlainExplanation::new().dump().unwrap();
        assert_eq!(json, r#"{"kind":"plain","explanations":null}"#);
        assert!(PlainExplanation::from_json(&json).unwrap().is_empty());
    }

    #[test]
    fn test_from_json_rejects_other_kinds() {
        let err = PlainExplanation::from_json(r#"{"kind":"pixel","explanations":null}"#).unwrap_err();
        assert!(matches!(err, CoreError::SerializationError(_)));
        assert!(PlainExplanation::from_json("not json").is_err());
    }

    #[test]
    fn test_deserialize_checks_kind() {
        let json = r#"{"kind":"pixel","explanations":null}"#;
        assert!(serde_json::from_str::<PlainExplanation>(json).is_err());
        let exp: PlainExplanation =
            serde_json::from_str(r#"{"kind":"plain","explanations":null}"#).unwrap();
        assert!(exp.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.json");
        let mut exp = PlainExplanation::new();
        exp.add(images(2), None).unwrap();

        exp.save(&path).unwrap();
        assert_eq!(PlainExplanation::load(&path).unwrap(), exp);
    }
}
