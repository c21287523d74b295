//! Preview images: opaque encoded blobs and their decoded form.
//!
//! The backend ships base64-encoded PNGs. [`ImageBlob`] is the encoded
//! bytes (what the cache keeps); [`PreviewImage`] is the decoded RGBA raster
//! a node displays. Blobs are cheap to clone (`Arc<[u8]>`).

use std::sync::Arc;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encoded image bytes as delivered by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob(Arc<[u8]>);

impl ImageBlob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }

    /// Decode a base64 payload entry.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        // Tolerate data URLs: "data:image/png;base64,...."
        let payload = encoded
            .split_once(";base64,")
            .map(|(_, rest)| rest)
            .unwrap_or(encoded);
        let bytes = STANDARD
            .decode(payload.trim())
            .context("Invalid base64 image payload")?;
        Ok(Self::new(bytes))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode into a displayable raster.
    pub fn decode(&self) -> Result<PreviewImage> {
        let img = image::load_from_memory(&self.0).context("Failed to decode preview image")?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(PreviewImage {
            width,
            height,
            pixels: Arc::new(rgba.into_raw()),
        })
    }
}

/// Decoded RGBA8 raster shown on a node.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<Vec<u8>>,
}

impl PreviewImage {
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Decode an ordered blob set into image slots, keeping absent entries.
///
/// A blob that fails to decode becomes an empty slot and is logged.
pub fn decode_all(blobs: &[Option<ImageBlob>]) -> Vec<Option<PreviewImage>> {
    blobs
        .iter()
        .map(|slot| {
            slot.as_ref().and_then(|blob| match blob.decode() {
                Ok(img) => Some(img),
                Err(e) => {
                    log::warn!("Dropping undecodable preview blob ({} bytes): {:#}", blob.len(), e);
                    None
                }
            })
        })
        .collect()
}

/// Encode an RGBA8 PNG. Used by tests and the mock backend.
pub fn encode_png(width: u32, height: u32, rgba: [u8; 4]) -> Result<ImageBlob> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .context("Failed to encode PNG")?;
    Ok(ImageBlob::new(out.into_inner()))
}

/// Base64 form of a blob, as it travels over the wire.
pub fn to_base64(blob: &ImageBlob) -> String {
    STANDARD.encode(blob.bytes())
}
