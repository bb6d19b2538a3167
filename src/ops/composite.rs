//! Layer overlay images onto a base image.
//!
//! Porter-Duff operators and separable blend modes follow the W3C
//! compositing model: `S` is the overlay (source), `B` the base
//! (destination), both straight-alpha in `[0, 1]` during blending.

use super::geometry::Gravity;
use super::{restore_color, to_u8, Transform};
use crate::core::error::{TransformError, TransformResult};
use image::{DynamicImage, GenericImageView, RgbaImage};
use std::str::FromStr;

/// How an overlay is combined with the image below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Clear,
    Source,
    Over,
    In,
    Out,
    Atop,
    Dest,
    DestOver,
    DestIn,
    DestOut,
    DestAtop,
    Xor,
    Add,
    Saturate,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
}

impl FromStr for BlendMode {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "clear" => BlendMode::Clear,
            "source" => BlendMode::Source,
            "over" => BlendMode::Over,
            "in" => BlendMode::In,
            "out" => BlendMode::Out,
            "atop" => BlendMode::Atop,
            "dest" => BlendMode::Dest,
            "dest-over" => BlendMode::DestOver,
            "dest-in" => BlendMode::DestIn,
            "dest-out" => BlendMode::DestOut,
            "dest-atop" => BlendMode::DestAtop,
            "xor" => BlendMode::Xor,
            "add" => BlendMode::Add,
            "saturate" => BlendMode::Saturate,
            "multiply" => BlendMode::Multiply,
            "screen" => BlendMode::Screen,
            "overlay" => BlendMode::Overlay,
            "darken" => BlendMode::Darken,
            "lighten" => BlendMode::Lighten,
            "colour-dodge" | "color-dodge" => BlendMode::ColorDodge,
            "colour-burn" | "color-burn" => BlendMode::ColorBurn,
            "hard-light" => BlendMode::HardLight,
            "soft-light" => BlendMode::SoftLight,
            "difference" => BlendMode::Difference,
            "exclusion" => BlendMode::Exclusion,
            other => {
                return Err(TransformError::invalid(
                    "blend",
                    format!("unknown blend mode '{}'", other),
                ))
            }
        })
    }
}

/// Every accepted `blend` spelling, in schema order.
pub const BLEND_MODES: &[&str] = &[
    "clear",
    "source",
    "over",
    "in",
    "out",
    "atop",
    "dest",
    "dest-over",
    "dest-in",
    "dest-out",
    "dest-atop",
    "xor",
    "add",
    "saturate",
    "multiply",
    "screen",
    "overlay",
    "darken",
    "lighten",
    "colour-dodge",
    "color-dodge",
    "colour-burn",
    "color-burn",
    "hard-light",
    "soft-light",
    "difference",
    "exclusion",
];

impl BlendMode {
    /// Porter-Duff fractions `(Fa, Fb)` for the pure operators.
    fn porter_duff(&self, a_s: f32, a_b: f32) -> Option<(f32, f32)> {
        Some(match self {
            BlendMode::Clear => (0.0, 0.0),
            BlendMode::Source => (1.0, 0.0),
            BlendMode::Over => (1.0, 1.0 - a_s),
            BlendMode::In => (a_b, 0.0),
            BlendMode::Out => (1.0 - a_b, 0.0),
            BlendMode::Atop => (a_b, 1.0 - a_s),
            BlendMode::Dest => (0.0, 1.0),
            BlendMode::DestOver => (1.0 - a_b, 1.0),
            BlendMode::DestIn => (0.0, a_s),
            BlendMode::DestOut => (0.0, 1.0 - a_s),
            BlendMode::DestAtop => (1.0 - a_b, a_s),
            BlendMode::Xor => (1.0 - a_b, 1.0 - a_s),
            _ => return None,
        })
    }

    /// Separable blend function `B(Cb, Cs)`.
    fn blend(&self, cb: f32, cs: f32) -> f32 {
        match self {
            BlendMode::Multiply => cb * cs,
            BlendMode::Screen => cb + cs - cb * cs,
            BlendMode::Overlay => BlendMode::HardLight.blend(cs, cb),
            BlendMode::Darken => cb.min(cs),
            BlendMode::Lighten => cb.max(cs),
            BlendMode::ColorDodge => {
                if cb == 0.0 {
                    0.0
                } else if cs >= 1.0 {
                    1.0
                } else {
                    (cb / (1.0 - cs)).min(1.0)
                }
            }
            BlendMode::ColorBurn => {
                if cb >= 1.0 {
                    1.0
                } else if cs <= 0.0 {
                    0.0
                } else {
                    1.0 - ((1.0 - cb) / cs).min(1.0)
                }
            }
            BlendMode::HardLight => {
                if cs <= 0.5 {
                    cb * 2.0 * cs
                } else {
                    let s = 2.0 * cs - 1.0;
                    cb + s - cb * s
                }
            }
            BlendMode::SoftLight => {
                if cs <= 0.5 {
                    cb - (1.0 - 2.0 * cs) * cb * (1.0 - cb)
                } else {
                    let d = if cb <= 0.25 {
                        ((16.0 * cb - 12.0) * cb + 4.0) * cb
                    } else {
                        cb.sqrt()
                    };
                    cb + (2.0 * cs - 1.0) * (d - cb)
                }
            }
            BlendMode::Difference => (cb - cs).abs(),
            BlendMode::Exclusion => cb + cs - 2.0 * cb * cs,
            _ => cs,
        }
    }

    /// Composite one straight-alpha pixel over another.
    fn composite(&self, base: [f32; 4], src: [f32; 4]) -> [f32; 4] {
        let (a_b, a_s) = (base[3], src[3]);

        // Premultiplied output color and alpha.
        let (co, ao): ([f32; 3], f32) = if let Some((fa, fb)) = self.porter_duff(a_s, a_b) {
            let co = std::array::from_fn(|i| a_s * fa * src[i] + a_b * fb * base[i]);
            (co, a_s * fa + a_b * fb)
        } else {
            match self {
                BlendMode::Add => {
                    let co = std::array::from_fn(|i| a_s * src[i] + a_b * base[i]);
                    (co, (a_s + a_b).min(1.0))
                }
                BlendMode::Saturate => {
                    let f = if a_s > 0.0 { ((1.0 - a_b) / a_s).min(1.0) } else { 1.0 };
                    let co = std::array::from_fn(|i| a_s * f * src[i] + a_b * base[i]);
                    (co, (a_s * f + a_b).min(1.0))
                }
                _ => {
                    let co = std::array::from_fn(|i| {
                        let mixed = (1.0 - a_b) * src[i] + a_b * self.blend(base[i], src[i]);
                        a_s * mixed + a_b * (1.0 - a_s) * base[i]
                    });
                    (co, a_s + a_b * (1.0 - a_s))
                }
            }
        };

        if ao <= 0.0 {
            return [0.0; 4];
        }
        [
            (co[0] / ao).min(1.0),
            (co[1] / ao).min(1.0),
            (co[2] / ao).min(1.0),
            ao.min(1.0),
        ]
    }
}

/// Layer one or more overlays onto an image.
#[derive(Debug, Clone)]
pub struct Composite {
    /// Overlays, applied in order.
    pub overlays: Vec<DynamicImage>,
    pub blend: BlendMode,
    pub gravity: Gravity,
    /// Explicit offsets; either one set overrides gravity.
    pub top: Option<i64>,
    pub left: Option<i64>,
    /// Repeat each overlay across the whole image.
    pub tile: bool,
    /// Treat the base image as already premultiplied.
    pub premultiplied: bool,
    /// Rasterisation density for vector overlays.
    pub density: f64,
}

impl Composite {
    /// Top-left corners at which one overlay is drawn.
    fn placements(&self, base: (u32, u32), overlay: (u32, u32)) -> Vec<(i64, i64)> {
        let origin = if self.top.is_some() || self.left.is_some() {
            (self.left.unwrap_or(0), self.top.unwrap_or(0))
        } else {
            self.gravity.offset(base, overlay)
        };
        if !self.tile {
            return vec![origin];
        }

        let (ow, oh) = (i64::from(overlay.0), i64::from(overlay.1));
        let start_x = origin.0.rem_euclid(ow) - if origin.0.rem_euclid(ow) > 0 { ow } else { 0 };
        let start_y = origin.1.rem_euclid(oh) - if origin.1.rem_euclid(oh) > 0 { oh } else { 0 };
        let mut out = Vec::new();
        let mut y = start_y;
        while y < i64::from(base.1) {
            let mut x = start_x;
            while x < i64::from(base.0) {
                out.push((x, y));
                x += ow;
            }
            y += oh;
        }
        out
    }

    fn layer(&self, canvas: &mut [[f32; 4]], size: (u32, u32), overlay: &RgbaImage) {
        let (w, h) = size;
        let (ow, oh) = overlay.dimensions();
        let covers_all = matches!(
            self.blend,
            BlendMode::Clear
                | BlendMode::Source
                | BlendMode::In
                | BlendMode::Out
                | BlendMode::DestIn
                | BlendMode::DestAtop
        );

        let mut touched = vec![false; canvas.len()];
        for (px, py) in self.placements(size, (ow, oh)) {
            for (x, y, pixel) in overlay.enumerate_pixels() {
                let (tx, ty) = (px + i64::from(x), py + i64::from(y));
                if tx < 0 || ty < 0 || tx >= i64::from(w) || ty >= i64::from(h) {
                    continue;
                }
                let idx = ty as usize * w as usize + tx as usize;
                let src = pixel.0.map(|c| c as f32 / 255.0);
                canvas[idx] = self.blend.composite(canvas[idx], src);
                touched[idx] = true;
            }
        }

        // Operators that depend on the source also act where it is absent.
        if covers_all {
            let empty = [0.0; 4];
            for (idx, hit) in touched.iter().enumerate() {
                if !hit {
                    canvas[idx] = self.blend.composite(canvas[idx], empty);
                }
            }
        }
    }
}

impl Transform for Composite {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn apply(&self, image: DynamicImage) -> TransformResult<DynamicImage> {
        if !(1.0..=600.0).contains(&self.density) {
            return Err(TransformError::invalid("density", "must be within [1, 600]"));
        }

        let color = image.color();
        let (w, h) = image.dimensions();
        for overlay in &self.overlays {
            if overlay.width() == 0 || overlay.height() == 0 {
                return Err(TransformError::invalid("compositeImages", "overlay is empty"));
            }
        }

        let base = image.to_rgba8();
        let mut canvas: Vec<[f32; 4]> = base
            .pixels()
            .map(|p| {
                let mut px = p.0.map(|c| c as f32 / 255.0);
                let alpha = px[3];
                if self.premultiplied && alpha > 0.0 {
                    for c in &mut px[..3] {
                        *c = (*c / alpha).min(1.0);
                    }
                }
                px
            })
            .collect();

        for overlay in &self.overlays {
            self.layer(&mut canvas, (w, h), &overlay.to_rgba8());
        }

        let mut out = RgbaImage::new(w, h);
        for (pixel, px) in out.pixels_mut().zip(canvas) {
            let alpha = if self.premultiplied { px[3] } else { 1.0 };
            pixel.0 = [
                to_u8(px[0] * alpha * 255.0),
                to_u8(px[1] * alpha * 255.0),
                to_u8(px[2] * alpha * 255.0),
                to_u8(px[3] * 255.0),
            ];
        }
        Ok(restore_color(out, color))
    }
}
