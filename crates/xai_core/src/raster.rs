//! Owned pixel buffers used as explanation payloads.

use std::io::Cursor;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// An owned 8-bit image.
///
/// Pixels are stored row-major and interleaved, so
/// `data.len() == width * height * channels`. Supported channel counts are
/// 1 (grayscale), 3 (RGB) and 4 (RGBA).
///
/// # Example
///
/// ```rust
/// use xai_core::Image;
///
/// let img = Image::new(4, 2, 3, vec![0; 4 * 2 * 3]).unwrap();
/// assert_eq!(img.dimensions(), (4, 2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawImage")]
pub struct Image {
    width: u32,
    height: u32,
    channels: u8,
    #[serde(with = "base64_bytes")]
    data: Vec<u8>,
}

/// Unchecked wire form of [`Image`], validated on the way in.
#[derive(Deserialize)]
struct RawImage {
    width: u32,
    height: u32,
    channels: u8,
    #[serde(with = "base64_bytes")]
    data: Vec<u8>,
}

impl TryFrom<RawImage> for Image {
    type Error = CoreError;

    fn try_from(raw: RawImage) -> Result<Self> {
        Image::new(raw.width, raw.height, raw.channels, raw.data)
    }
}

impl Image {
    /// Create an image from raw interleaved pixels.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] for zero dimensions or an
    /// unsupported channel count, and [`CoreError::ShapeMismatch`] when the
    /// buffer length does not match the dimensions.
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidInput(format!(
                "image dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        if !matches!(channels, 1 | 3 | 4) {
            return Err(CoreError::InvalidInput(format!(
                "unsupported channel count {}",
                channels
            )));
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(CoreError::ShapeMismatch(format!(
                "{}x{}x{} image needs {} bytes, got {}",
                width,
                height,
                channels,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// A single-color RGB image.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Result<Self> {
        let n = width as usize * height as usize;
        let data = rgb.iter().copied().cycle().take(n * 3).collect();
        Self::new(width, height, 3, data)
    }

    /// Convert from an [`image::DynamicImage`].
    ///
    /// 16-bit and float images are narrowed to 8 bits; the alpha channel is
    /// kept only when the source has one.
    pub fn from_dynamic(img: DynamicImage) -> Result<Self> {
        let (width, height) = (img.width(), img.height());
        let (channels, data) = match img {
            DynamicImage::ImageLuma8(buf) => (1, buf.into_raw()),
            DynamicImage::ImageRgb8(buf) => (3, buf.into_raw()),
            DynamicImage::ImageRgba8(buf) => (4, buf.into_raw()),
            other if other.color().has_alpha() => (4, other.to_rgba8().into_raw()),
            other if other.color().has_color() => (3, other.to_rgb8().into_raw()),
            other => (1, other.to_luma8().into_raw()),
        };
        Self::new(width, height, channels, data)
    }

    /// Convert into an [`image::DynamicImage`] with the same channel layout.
    pub fn to_dynamic(&self) -> Result<DynamicImage> {
        let (w, h, data) = (self.width, self.height, self.data.clone());
        let img = match self.channels {
            1 => GrayImage::from_raw(w, h, data).map(DynamicImage::ImageLuma8),
            3 => RgbImage::from_raw(w, h, data).map(DynamicImage::ImageRgb8),
            _ => RgbaImage::from_raw(w, h, data).map(DynamicImage::ImageRgba8),
        };
        img.ok_or_else(|| CoreError::ShapeMismatch(format!("buffer too small for {}x{}", w, h)))
    }

    /// Load an image file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let img = image::open(path.as_ref())?;
        Self::from_dynamic(img)
    }

    /// Resize to exactly `width x height` with bilinear filtering.
    pub fn resize(&self, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidInput(format!(
                "resize target must be positive, got {}x{}",
                width, height
            )));
        }
        let resized = self
            .to_dynamic()?
            .resize_exact(width, height, FilterType::Triangle);
        Self::from_dynamic(resized)
    }

    /// Encode as PNG.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        self.to_dynamic()?.write_to(&mut buf, ImageFormat::Png)?;
        Ok(buf.into_inner())
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` in pixels.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of interleaved channels.
    #[must_use]
    pub const fn channels(&self) -> u8 {
        self.channels
    }

    /// Width divided by height.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// Raw interleaved pixels.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at `(x, y)` widened to RGB.
    pub fn rgb_at(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let c = self.channels as usize;
        let idx = (y as usize * self.width as usize + x as usize) * c;
        let px = &self.data[idx..idx + c];
        Some(if c == 1 {
            [px[0]; 3]
        } else {
            [px[0], px[1], px[2]]
        })
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> Image {
        let data = (0..w * h * 3).map(|i| (i % 251) as u8).collect();
        Image::new(w, h, 3, data).unwrap()
    }

    #[test]
    fn test_new_validates_length() {
        assert!(Image::new(2, 2, 3, vec![0; 12]).is_ok());
        let err = Image::new(2, 2, 3, vec![0; 11]).unwrap_err();
        assert!(matches!(err, CoreError::ShapeMismatch(_)));
    }

    #[test]
    fn test_new_rejects_zero_dims() {
        let err = Image::new(0, 4, 1, vec![]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn test_new_rejects_two_channels() {
        let err = Image::new(1, 1, 2, vec![0, 0]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn test_dynamic_conversion_keeps_channels() {
        let gray = Image::new(3, 2, 1, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let back = Image::from_dynamic(gray.to_dynamic().unwrap()).unwrap();
        assert_eq!(back, gray);
    }

    #[test]
    fn test_resize() {
        let img = gradient(20, 10);
        let small = img.resize(8, 4).unwrap();
        assert_eq!(small.dimensions(), (8, 4));
        assert_eq!(small.channels(), 3);
        assert!(img.resize(0, 4).is_err());
    }

    #[test]
    fn test_png_encoding_decodes_back() {
        let img = gradient(5, 7);
        let png = img.to_png_bytes().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(Image::from_dynamic(decoded).unwrap(), img);
    }

    #[test]
    fn test_json_uses_base64_payload() {
        let img = Image::filled(1, 1, [255, 0, 0]).unwrap();
        let json = serde_json::to_string(&img).unwrap();
        assert_eq!(json, r#"{"width":1,"height":1,"channels":3,"data":"/wAA"}"#);
        let back: Image = serde_json::from_str(&json).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn test_json_rejects_inconsistent_payload() {
        let json = r#"{"width":2,"height":1,"channels":3,"data":"/wAA"}"#;
        assert!(serde_json::from_str::<Image>(json).is_err());
    }

    #[test]
    fn test_aspect_ratio() {
        assert_eq!(Image::filled(40, 10, [0, 0, 0]).unwrap().aspect_ratio(), 4.0);
        assert_eq!(Image::filled(10, 40, [0, 0, 0]).unwrap().aspect_ratio(), 0.25);
    }

    #[test]
    fn test_rgb_at() {
        let img = Image::filled(2, 2, [10, 20, 30]).unwrap();
        assert_eq!(img.rgb_at(1, 1), Some([10, 20, 30]));
        assert_eq!(img.rgb_at(2, 0), None);
        let gray = Image::new(1, 1, 1, vec![7]).unwrap();
        assert_eq!(gray.rgb_at(0, 0), Some([7, 7, 7]));
    }

    #[test]
    fn test_open_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.png");
        gradient(6, 3).to_dynamic().unwrap().save(&path).unwrap();
        let loaded = Image::open(&path).unwrap();
        assert_eq!(loaded.dimensions(), (6, 3));
    }
}
