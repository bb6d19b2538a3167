//! Color operations: tint, grayscale and modulate.

use super::{restore_color, to_u8, Transform};
use crate::core::error::{TransformError, TransformResult};
use crate::core::types::Meta;
use image::{DynamicImage, RgbaImage};
use rayon::prelude::*;
use serde_json::json;

/// Apply `f` to the RGB part of every pixel, leaving alpha untouched.
fn map_rgb<F>(mut rgba: RgbaImage, f: F) -> RgbaImage
where
    F: Fn([f32; 3]) -> [f32; 3] + Sync,
{
    rgba.par_chunks_mut(4).for_each(|px| {
        let out = f([px[0] as f32, px[1] as f32, px[2] as f32]);
        px[0] = to_u8(out[0]);
        px[1] = to_u8(out[1]);
        px[2] = to_u8(out[2]);
    });
    rgba
}

// ============================================================================
// Tint
// ============================================================================

/// Recolor an image while keeping its luminance.
///
/// Each pixel keeps its own luma; its chroma is replaced by the chroma of
/// the tint color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tint {
    pub red: i64,
    pub green: i64,
    pub blue: i64,
}

impl Tint {
    fn luma([r, g, b]: [f32; 3]) -> f32 {
        0.299 * r + 0.587 * g + 0.114 * b
    }
}

impl Transform for Tint {
    fn name(&self) -> &'static str {
        "tint"
    }

    fn apply(&self, image: DynamicImage) -> TransformResult<DynamicImage> {
        for (name, value) in [("red", self.red), ("green", self.green), ("blue", self.blue)] {
            if !(0..=255).contains(&value) {
                return Err(TransformError::invalid(name, "must be within [0, 255]"));
            }
        }

        let tint = [self.red as f32, self.green as f32, self.blue as f32];
        let tint_luma = Self::luma(tint);
        let cr = tint[0] - tint_luma;
        let cb = tint[2] - tint_luma;

        let color = image.color();
        let out = map_rgb(image.to_rgba8(), |px| {
            let y = Self::luma(px);
            let r = y + cr;
            let b = y + cb;
            let g = (y - 0.299 * r - 0.114 * b) / 0.587;
            [r, g, b]
        });

        // Tinting always yields color, even from a grayscale source.
        let color = if color.has_alpha() {
            image::ColorType::Rgba8
        } else {
            image::ColorType::Rgb8
        };
        Ok(restore_color(out, color))
    }

    fn annotations(&self) -> Meta {
        let mut meta = Meta::new();
        meta.insert(
            "tint".to_string(),
            json!({ "r": self.red, "g": self.green, "b": self.blue }),
        );
        meta
    }
}

// ============================================================================
// Grayscale
// ============================================================================

/// Convert to grayscale, keeping any alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grayscale {
    pub enabled: bool,
}

impl Transform for Grayscale {
    fn name(&self) -> &'static str {
        "grayscale"
    }

    fn apply(&self, image: DynamicImage) -> TransformResult<DynamicImage> {
        if !self.enabled {
            return Ok(image);
        }
        Ok(image.grayscale())
    }

    fn annotations(&self) -> Meta {
        let mut meta = Meta::new();
        meta.insert("grayscale".to_string(), json!(self.enabled));
        meta
    }

    fn is_identity(&self) -> bool {
        !self.enabled
    }
}

// ============================================================================
// Modulate
// ============================================================================

/// Adjust brightness, saturation, lightness and hue in HSL space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modulate {
    /// Lightness multiplier.
    pub brightness: f64,
    /// Saturation multiplier.
    pub saturation: f64,
    /// Lightness offset in percent.
    pub lightness: f64,
    /// Hue rotation in degrees; `None` skips the rotation.
    pub hue: Option<f64>,
}

impl Modulate {
    /// Build a modulation. A hue of exactly zero is dropped.
    pub fn new(brightness: f64, saturation: f64, lightness: f64, hue: f64) -> Self {
        Self {
            brightness,
            saturation,
            lightness,
            hue: (hue != 0.0).then_some(hue),
        }
    }

    fn adjust(&self, [r, g, b]: [f32; 3]) -> [f32; 3] {
        let (h, s, l) = rgb_to_hsl(r / 255.0, g / 255.0, b / 255.0);
        let h = match self.hue {
            Some(hue) => (h + hue as f32).rem_euclid(360.0),
            None => h,
        };
        let s = (s * self.saturation as f32).clamp(0.0, 1.0);
        let l = (l * self.brightness as f32 + self.lightness as f32 / 100.0).clamp(0.0, 1.0);
        let (r, g, b) = hsl_to_rgb(h, s, l);
        [r * 255.0, g * 255.0, b * 255.0]
    }
}

impl Transform for Modulate {
    fn name(&self) -> &'static str {
        "modulate"
    }

    fn apply(&self, image: DynamicImage) -> TransformResult<DynamicImage> {
        if self.brightness.is_nan() || self.brightness < 0.0 {
            return Err(TransformError::invalid("brightness", "must be zero or positive"));
        }
        if self.saturation.is_nan() || self.saturation < 0.0 {
            return Err(TransformError::invalid("saturation", "must be zero or positive"));
        }
        if !self.lightness.is_finite() {
            return Err(TransformError::invalid("lightness", "must be a finite number"));
        }
        if self.hue.is_some_and(|h| !h.is_finite()) {
            return Err(TransformError::invalid("hue", "must be a finite number"));
        }

        let color = image.color();
        let out = map_rgb(image.to_rgba8(), |px| self.adjust(px));
        Ok(restore_color(out, color))
    }
}

/// RGB in `[0, 1]` to (hue degrees, saturation, lightness).
fn rgb_to_hsl(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    let delta = max - min;
    if delta == 0.0 {
        return (0.0, 0.0, l);
    }

    let s = if l > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };
    let h = if max == r {
        ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };
    (h * 60.0, s, l)
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    (r + m, g + m, b + m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, Rgb, RgbImage, Rgba};

    #[test]
    fn test_tint_keeps_luma_and_alpha() {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([100, 100, 100, 255]));
        img.put_pixel(1, 1, Rgba([100, 100, 100, 40]));
        let tint = Tint { red: 150, green: 100, blue: 100 };
        let out = tint.apply(DynamicImage::ImageRgba8(img)).unwrap().to_rgba8();

        let px = out.get_pixel(0, 0).0;
        assert!(px[0] > px[1] && px[0] > px[2]);
        let luma = Tint::luma([px[0] as f32, px[1] as f32, px[2] as f32]);
        assert!((luma - 100.0).abs() < 2.0);
        assert_eq!(out.get_pixel(1, 1).0[3], 40);
    }

    #[test]
    fn test_tint_rejects_out_of_range() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(1, 1));
        assert!(Tint { red: 256, green: 0, blue: 0 }.apply(img).is_err());
    }

    #[test]
    fn test_tint_annotation() {
        let meta = Tint { red: 12, green: 7, blue: 0 }.annotations();
        assert_eq!(meta["tint"], json!({"r": 12, "g": 7, "b": 0}));
    }

    #[test]
    fn test_grayscale() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([200, 10, 10])));
        let out = Grayscale { enabled: true }.apply(img.clone()).unwrap();
        assert_eq!(out.color(), ColorType::L8);

        let off = Grayscale { enabled: false };
        assert!(off.is_identity());
        assert_eq!(off.apply(img.clone()).unwrap(), img);
        assert_eq!(off.annotations()["grayscale"], json!(false));
    }

    #[test]
    fn test_modulate_drops_zero_hue() {
        assert_eq!(Modulate::new(1.0, 1.0, 0.0, 0.0).hue, None);
        assert_eq!(Modulate::new(1.0, 1.0, 0.0, 90.0).hue, Some(90.0));
    }

    #[test]
    fn test_modulate_identity_and_brightness() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([120, 60, 30])));
        let same = Modulate::new(1.0, 1.0, 0.0, 0.0).apply(img.clone()).unwrap().to_rgb8();
        let px = same.get_pixel(0, 0).0;
        assert!(px.iter().zip([120u8, 60, 30]).all(|(a, b)| a.abs_diff(b) <= 1));

        let brighter = Modulate::new(1.5, 1.0, 0.0, 0.0).apply(img).unwrap().to_rgb8();
        assert!(brighter.get_pixel(0, 0).0[0] > 120);
    }

    #[test]
    fn test_modulate_rejects_negative() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(1, 1));
        assert!(Modulate::new(-1.0, 1.0, 0.0, 0.0).apply(img).is_err());
    }

    #[test]
    fn test_hsl_round_trip() {
        let (h, s, l) = rgb_to_hsl(1.0, 0.0, 0.0);
        assert_eq!((h, s, l), (0.0, 1.0, 0.5));
        let (r, g, b) = hsl_to_rgb(120.0, 1.0, 0.5);
        assert!((r - 0.0).abs() < 1e-6 && (g - 1.0).abs() < 1e-6 && (b - 0.0).abs() < 1e-6);
    }
}
