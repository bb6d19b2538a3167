//! Channel operations: extract a channel, remove or ensure alpha.

use super::Transform;
use crate::core::error::{TransformError, TransformResult};
use image::{DynamicImage, GrayImage};
use std::str::FromStr;

/// A single image channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
    Alpha,
}

impl Channel {
    fn index(&self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
            Channel::Alpha => 3,
        }
    }
}

impl FromStr for Channel {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "red" => Ok(Channel::Red),
            "green" => Ok(Channel::Green),
            "blue" => Ok(Channel::Blue),
            "alpha" => Ok(Channel::Alpha),
            other => Err(TransformError::invalid(
                "channel",
                format!("unknown channel '{}'", other),
            )),
        }
    }
}

/// Extract one channel as a single-band image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractChannel {
    pub channel: Channel,
}

impl Transform for ExtractChannel {
    fn name(&self) -> &'static str {
        "extractChannel"
    }

    fn apply(&self, image: DynamicImage) -> TransformResult<DynamicImage> {
        if self.channel == Channel::Alpha && !image.color().has_alpha() {
            return Err(TransformError::invalid(
                "channel",
                "image has no alpha channel to extract",
            ));
        }

        let rgba = image.to_rgba8();
        let index = self.channel.index();
        let band = GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            image::Luma([rgba.get_pixel(x, y).0[index]])
        });
        Ok(DynamicImage::ImageLuma8(band))
    }
}

/// Drop the alpha channel, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoveAlpha;

impl Transform for RemoveAlpha {
    fn name(&self) -> &'static str {
        "removeAlpha"
    }

    fn apply(&self, image: DynamicImage) -> TransformResult<DynamicImage> {
        Ok(match image {
            DynamicImage::ImageLumaA8(_) => DynamicImage::ImageLuma8(image.to_luma8()),
            DynamicImage::ImageLumaA16(_) => DynamicImage::ImageLuma16(image.to_luma16()),
            DynamicImage::ImageRgba8(_) => DynamicImage::ImageRgb8(image.to_rgb8()),
            DynamicImage::ImageRgba16(_) => DynamicImage::ImageRgb16(image.to_rgb16()),
            DynamicImage::ImageRgba32F(_) => DynamicImage::ImageRgb32F(image.to_rgb32f()),
            other => other,
        })
    }
}

/// Add an alpha channel with a constant value when none exists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnsureAlpha {
    /// Opacity of the new channel, from 0 (transparent) to 1 (opaque).
    pub alpha: f64,
}

impl Transform for EnsureAlpha {
    fn name(&self) -> &'static str {
        "ensureAlpha"
    }

    fn apply(&self, image: DynamicImage) -> TransformResult<DynamicImage> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(TransformError::invalid("alpha", "must be within [0, 1]"));
        }
        if image.color().has_alpha() {
            return Ok(image);
        }

        let value = (self.alpha * 255.0).round() as u8;
        if image.color().has_color() {
            let mut rgba = image.to_rgba8();
            rgba.pixels_mut().for_each(|p| p.0[3] = value);
            Ok(DynamicImage::ImageRgba8(rgba))
        } else {
            let mut la = image.to_luma_alpha8();
            la.pixels_mut().for_each(|p| p.0[1] = value);
            Ok(DynamicImage::ImageLumaA8(la))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_extract_channel() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([10, 20, 30])));
        let op = ExtractChannel { channel: "green".parse().unwrap() };
        let out = op.apply(img).unwrap();

        assert_eq!(out.color(), ColorType::L8);
        assert_eq!(out.to_luma8().get_pixel(0, 0).0, [20]);
    }

    #[test]
    fn test_extract_alpha_requires_alpha() {
        let opaque = DynamicImage::ImageRgb8(RgbImage::new(1, 1));
        let op = ExtractChannel { channel: Channel::Alpha };
        assert!(matches!(
            op.apply(opaque),
            Err(TransformError::InvalidParameter { .. })
        ));

        let clear = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 77])));
        assert_eq!(op.apply(clear).unwrap().to_luma8().get_pixel(0, 0).0, [77]);
    }

    #[test]
    fn test_remove_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(1, 1));
        assert_eq!(RemoveAlpha.apply(img).unwrap().color(), ColorType::Rgb8);

        let opaque = DynamicImage::ImageRgb8(RgbImage::new(1, 1));
        assert_eq!(RemoveAlpha.apply(opaque).unwrap().color(), ColorType::Rgb8);
    }

    #[test]
    fn test_ensure_alpha() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(1, 1));
        let out = EnsureAlpha { alpha: 0.5 }.apply(img).unwrap();
        assert_eq!(out.color(), ColorType::Rgba8);
        assert_eq!(out.to_rgba8().get_pixel(0, 0).0[3], 128);

        let existing = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 9])));
        let out = EnsureAlpha { alpha: 1.0 }.apply(existing).unwrap();
        assert_eq!(out.to_rgba8().get_pixel(0, 0).0[3], 9);

        let img = DynamicImage::ImageRgb8(RgbImage::new(1, 1));
        assert!(EnsureAlpha { alpha: 1.5 }.apply(img).is_err());
    }
}
