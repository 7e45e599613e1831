use crate::error::{GenerationError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

/// Body of an inference call, serialized as `{"inputs": "<prompt>"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    #[serde(rename = "inputs")]
    prompt: String,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Result<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(GenerationError::InvalidPrompt);
        }
        Ok(Self { prompt })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

/// Raw payload returned by a successful inference call. Not yet known to be an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBytes(Vec<u8>);

impl ImageBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for ImageBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for ImageBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A decoded image together with the payload it came from.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    image: DynamicImage,
    format: ImageFormat,
    source: ImageBytes,
}

impl GeneratedImage {
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn source(&self) -> &ImageBytes {
        &self.source
    }

    /// Re-encodes the image as PNG, whatever format the endpoint returned.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.image
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| GenerationError::EncodeError(e.to_string()))?;
        Ok(buffer.into_inner())
    }

    pub fn to_base64_png(&self) -> Result<String> {
        Ok(STANDARD.encode(self.to_png_bytes()?))
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let png = self.to_png_bytes()?;
        std::fs::write(path.as_ref(), png)?;
        log::info!("💾 Image saved to: {}", path.as_ref().display());
        Ok(())
    }
}

/// Decodes a response payload into an image.
///
/// Fails with [`GenerationError::DecodeError`] carrying the first 200 bytes of
/// the payload when it is not a recognised raster format.
pub fn decode_image(bytes: &ImageBytes) -> Result<GeneratedImage> {
    let decoded = image::guess_format(bytes.as_slice()).and_then(|format| {
        image::load_from_memory_with_format(bytes.as_slice(), format).map(|img| (img, format))
    });

    match decoded {
        Ok((image, format)) => Ok(GeneratedImage {
            image,
            format,
            source: bytes.clone(),
        }),
        Err(e) => {
            let err = GenerationError::decode(bytes.as_slice(), e.to_string());
            if let GenerationError::DecodeError { preview, .. } = &err {
                log::error!("Failed to identify image. Possibly received non-image content.");
                log::error!("Response preview (first 200 bytes): {:?}", preview);
            }
            Err(err)
        }
    }
}

/// Small gradient PNG used as a stand-in for endpoint output in tests.
#[cfg(test)]
pub(crate) fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    use image::{Rgb, RgbImage};

    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 40 % 256) as u8, (y * 40 % 256) as u8, 128])
    });
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}
