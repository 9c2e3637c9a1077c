//! Batches of images with optional display names.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::raster::Image;

/// File extensions picked up by [`ImageBatch::from_dir`].
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// An ordered, non-empty batch of images.
///
/// When names are present there is exactly one per image; they are used as
/// captions by the figure backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBatch")]
pub struct ImageBatch {
    #[serde(rename = "image")]
    images: Vec<Image>,
    #[serde(rename = "name")]
    names: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct RawBatch {
    image: Vec<Image>,
    name: Option<Vec<String>>,
}

impl TryFrom<RawBatch> for ImageBatch {
    type Error = CoreError;

    fn try_from(raw: RawBatch) -> Result<Self> {
        ImageBatch::new(raw.image, raw.name)
    }
}

impl ImageBatch {
    /// Create a batch.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] for an empty batch or when `names`
    /// has a different length.
    pub fn new(images: Vec<Image>, names: Option<Vec<String>>) -> Result<Self> {
        if images.is_empty() {
            return Err(CoreError::InvalidInput("image batch is empty".to_string()));
        }
        if let Some(names) = &names {
            if names.len() != images.len() {
                return Err(CoreError::InvalidInput(format!(
                    "{} names for {} images",
                    names.len(),
                    images.len()
                )));
            }
        }
        Ok(Self { images, names })
    }

    /// Load every image file in `dir`, sorted by file name.
    ///
    /// File stems become the names of the batch.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if path.is_file() && is_image {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(CoreError::InvalidInput(format!(
                "no images found in {}",
                dir.display()
            )));
        }

        let mut images = Vec::with_capacity(paths.len());
        let mut names = Vec::with_capacity(paths.len());
        for path in &paths {
            images.push(Image::open(path)?);
            names.push(
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            );
        }
        tracing::debug!("Loaded {} images from {}", images.len(), dir.display());

        Self::new(images, Some(names))
    }

    /// Number of images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Always false; batches are non-empty by construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// The representative image whose dimensions drive layout.
    #[must_use]
    pub fn first(&self) -> &Image {
        &self.images[0]
    }

    /// All images.
    #[must_use]
    pub fn images(&self) -> &[Image] {
        &self.images
    }

    /// Display names, if any.
    #[must_use]
    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    /// Name of the image at `index`.
    #[must_use]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names
            .as_ref()
            .and_then(|names| names.get(index))
            .map(String::as_str)
    }

    /// Iterate over `(image, name)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Image, Option<&str>)> + '_ {
        self.images
            .iter()
            .enumerate()
            .map(move |(i, img)| (img, self.name(i)))
    }

    /// True when every image has the dimensions of the first one.
    #[must_use]
    pub fn is_uniform(&self) -> bool {
        let dims = self.first().dimensions();
        self.images.iter().all(|img| img.dimensions() == dims)
    }

    /// Split into images and names.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Image>, Option<Vec<String>>) {
        (self.images, self.names)
    }
}

impl fmt::Display for ImageBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{'image': [")?;
        for (i, img) in self.images.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "<{}x{}x{}>", img.width(), img.height(), img.channels())?;
        }
        write!(f, "], 'name': ")?;
        match &self.names {
            Some(names) => write!(f, "{:?}", names)?,
            None => write!(f, "None")?,
        }
        write!(f, "}}")
    }
}
