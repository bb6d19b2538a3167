//! Header metadata derived from encoded bytes.

use crate::core::error::{TransformError, TransformResult};
use crate::core::types::{ImageFormat, ImageHandle, Meta};
use image::{ColorType, ImageDecoder, ImageReader};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Cursor;

/// Facts read from an image header without decoding pixel data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: String,
    /// Encoded size in bytes.
    pub size: usize,
    pub channels: u8,
    pub has_alpha: bool,
    /// Sample type: `uchar`, `ushort` or `float`.
    pub depth: String,
    /// Color space: `srgb` or `b-w`.
    pub space: String,
}

impl ImageInfo {
    /// Read the header of `bytes`.
    pub fn read(bytes: &[u8]) -> TransformResult<Self> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| TransformError::Decode(e.to_string()))?;
        let format = reader
            .format()
            .map(ImageFormat::from_image_format)
            .unwrap_or(ImageFormat::Unknown);
        let decoder = reader.into_decoder()?;
        let (width, height) = decoder.dimensions();
        let color = decoder.color_type();

        Ok(Self {
            width,
            height,
            format: format.name().to_string(),
            size: bytes.len(),
            channels: color.channel_count(),
            has_alpha: color.has_alpha(),
            depth: depth_name(color).to_string(),
            space: if color.has_color() { "srgb" } else { "b-w" }.to_string(),
        })
    }

    /// Render as metadata fields.
    pub fn to_meta(&self) -> Meta {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Meta::new(),
        }
    }
}

fn depth_name(color: ColorType) -> &'static str {
    match color.bytes_per_pixel() / color.channel_count().max(1) {
        1 => "uchar",
        2 => "ushort",
        _ => "float",
    }
}

/// Re-derive header fields of a transformed handle.
///
/// A no-op for handles without data.
pub fn refresh_metadata(handle: &mut ImageHandle) -> TransformResult<()> {
    let Some(bytes) = handle.data.as_deref().filter(|d| !d.is_empty()) else {
        return Ok(());
    };
    let info = ImageInfo::read(bytes)?;
    for (key, value) in info.to_meta() {
        handle.meta.insert(key, value);
    }
    Ok(())
}
