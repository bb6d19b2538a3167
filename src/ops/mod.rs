//! Pixel operations.
//!
//! Every operation is a small typed value implementing [`Transform`]. It is
//! built from already-parsed parameters, owns no state between calls, and
//! rejects parameters it cannot honour with
//! [`TransformError::InvalidParameter`](crate::core::error::TransformError).
//! Codec work stays in [`codec`].

pub mod blur;
pub mod channel;
pub mod codec;
pub mod color;
pub mod composite;
pub mod geometry;
pub mod stats;

pub use blur::Blur;
pub use channel::{Channel, EnsureAlpha, ExtractChannel, RemoveAlpha};
pub use codec::{decode, encode};
pub use color::{Grayscale, Modulate, Tint};
pub use composite::{BlendMode, Composite};
pub use geometry::{
    Extend, ExtendMode, Extract, Fit, Gravity, Kernel, Resize, Rotate, Trim, TrimReference,
};
pub use stats::{ChannelStats, DominantColor, ImageStats};

use crate::core::error::{TransformError, TransformResult};
use crate::core::types::Meta;
use image::{ColorType, DynamicImage, RgbaImage};

/// A single, parameter-driven image operation.
pub trait Transform: Send + Sync {
    /// Operation name used in log lines.
    fn name(&self) -> &'static str;

    /// Apply the operation.
    fn apply(&self, image: DynamicImage) -> TransformResult<DynamicImage>;

    /// Fields merged into the persisted object's metadata.
    fn annotations(&self) -> Meta {
        Meta::new()
    }

    /// Whether the operation leaves the encoded bytes untouched.
    ///
    /// Identity operations skip decoding and re-encoding entirely.
    fn is_identity(&self) -> bool {
        false
    }
}

/// Convert a working RGBA buffer back to the color layout of the source.
///
/// Alpha is kept when the source had it or when any output pixel is not
/// fully opaque.
pub(crate) fn restore_color(rgba: RgbaImage, original: ColorType) -> DynamicImage {
    let keep_alpha = original.has_alpha() || rgba.pixels().any(|p| p[3] != u8::MAX);
    let image = DynamicImage::ImageRgba8(rgba);
    match (original.has_color(), keep_alpha) {
        (true, true) => image,
        (true, false) => DynamicImage::ImageRgb8(image.into_rgb8()),
        (false, true) => DynamicImage::ImageLumaA8(image.into_luma_alpha8()),
        (false, false) => DynamicImage::ImageLuma8(image.into_luma8()),
    }
}

/// Largest image an operation may produce, in pixels.
pub const MAX_OUTPUT_PIXELS: u64 = 16_383 * 16_383;

/// Reject an output size above [`MAX_OUTPUT_PIXELS`] before allocating it.
pub(crate) fn check_output_size(parameter: &str, width: u32, height: u32) -> TransformResult<()> {
    if u64::from(width) * u64::from(height) > MAX_OUTPUT_PIXELS {
        return Err(TransformError::invalid(
            parameter,
            format!(
                "output of {}x{} exceeds {} pixels",
                width, height, MAX_OUTPUT_PIXELS
            ),
        ));
    }
    Ok(())
}

/// Clamp and round a float channel value into `u8`.
#[inline]
pub(crate) fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
