//! Geometry operations: rotate, extract, trim, extend and resize.

use super::{check_output_size, restore_color, Transform};
use crate::core::error::{TransformError, TransformResult};
use crate::core::types::{Color, Meta};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, RgbaImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use serde_json::json;
use std::str::FromStr;

// ============================================================================
// Gravity
// ============================================================================

/// Anchor used to place one rectangle inside another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gravity {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    Centre,
}

impl Gravity {
    /// Offset of an `inner` rectangle anchored inside an `outer` one.
    ///
    /// Offsets are negative when `inner` is the larger of the two, which is
    /// how a crop window is positioned over a bigger image.
    pub fn offset(&self, outer: (u32, u32), inner: (u32, u32)) -> (i64, i64) {
        let dx = outer.0 as i64 - inner.0 as i64;
        let dy = outer.1 as i64 - inner.1 as i64;
        let x = match self {
            Gravity::West | Gravity::NorthWest | Gravity::SouthWest => 0,
            Gravity::East | Gravity::NorthEast | Gravity::SouthEast => dx,
            Gravity::North | Gravity::South | Gravity::Centre => dx / 2,
        };
        let y = match self {
            Gravity::North | Gravity::NorthEast | Gravity::NorthWest => 0,
            Gravity::South | Gravity::SouthEast | Gravity::SouthWest => dy,
            Gravity::East | Gravity::West | Gravity::Centre => dy / 2,
        };
        (x, y)
    }
}

impl FromStr for Gravity {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "north" => Ok(Gravity::North),
            "northeast" => Ok(Gravity::NorthEast),
            "east" => Ok(Gravity::East),
            "southeast" => Ok(Gravity::SouthEast),
            "south" => Ok(Gravity::South),
            "southwest" => Ok(Gravity::SouthWest),
            "west" => Ok(Gravity::West),
            "northwest" => Ok(Gravity::NorthWest),
            "centre" | "center" => Ok(Gravity::Centre),
            other => Err(TransformError::invalid(
                "gravity",
                format!("unknown gravity '{}'", other),
            )),
        }
    }
}

/// Parse a color parameter.
pub(crate) fn parse_color(parameter: &str, value: &str) -> TransformResult<Color> {
    Color::parse(value).map_err(|reason| TransformError::invalid(parameter, reason))
}

// ============================================================================
// Rotate
// ============================================================================

/// Rotate clockwise by an arbitrary angle.
///
/// Multiples of 90 degrees are exact pixel rotations. Any other angle
/// expands the canvas to hold the rotated image and fills the uncovered
/// corners with `background`.
#[derive(Debug, Clone, PartialEq)]
pub struct Rotate {
    /// Angle in degrees as requested.
    pub angle: f64,
    /// Fill for uncovered corners.
    pub background: Color,
}

impl Rotate {
    /// Create a rotation.
    pub fn new(angle: f64, background: Color) -> Self {
        Self { angle, background }
    }

    /// Angle normalised into `[0, 360)`.
    pub fn normalized_angle(&self) -> f64 {
        self.angle.rem_euclid(360.0)
    }
}

impl Transform for Rotate {
    fn name(&self) -> &'static str {
        "rotate"
    }

    fn apply(&self, image: DynamicImage) -> TransformResult<DynamicImage> {
        if !self.angle.is_finite() {
            return Err(TransformError::invalid("angle", "must be a finite number"));
        }

        let angle = self.normalized_angle();
        if angle == 0.0 {
            return Ok(image);
        }
        if angle == 90.0 {
            return Ok(image.rotate90());
        }
        if angle == 180.0 {
            return Ok(image.rotate180());
        }
        if angle == 270.0 {
            return Ok(image.rotate270());
        }

        let color = image.color();
        let (w, h) = image.dimensions();
        let theta = angle.to_radians();
        let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
        let out_w = ((w as f64 * cos + h as f64 * sin).round() as u32).max(1);
        let out_h = ((w as f64 * sin + h as f64 * cos).round() as u32).max(1);
        check_output_size("angle", out_w, out_h)?;

        let fill = self.background.to_rgba();
        let mut canvas = RgbaImage::from_pixel(out_w, out_h, fill);
        let (x, y) = Gravity::Centre.offset((out_w, out_h), (w, h));
        imageops::overlay(&mut canvas, &image.to_rgba8(), x, y);

        let rotated = rotate_about_center(&canvas, theta as f32, Interpolation::Bilinear, fill);
        Ok(restore_color(rotated, color))
    }

    fn annotations(&self) -> Meta {
        let mut meta = Meta::new();
        // Whole angles are recorded as integers.
        let angle = if self.angle.fract() == 0.0 && self.angle.abs() <= 360.0 {
            json!(self.angle as i64)
        } else {
            json!(self.angle)
        };
        meta.insert("rotation".to_string(), angle);
        meta
    }
}

// ============================================================================
// Extract
// ============================================================================

/// Crop a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extract {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Transform for Extract {
    fn name(&self) -> &'static str {
        "extract"
    }

    fn apply(&self, image: DynamicImage) -> TransformResult<DynamicImage> {
        let (w, h) = image.dimensions();
        if self.width == 0 || self.height == 0 {
            return Err(TransformError::invalid("extract", "width and height must be positive"));
        }
        let fits_x = self.left.checked_add(self.width).is_some_and(|r| r <= w);
        let fits_y = self.top.checked_add(self.height).is_some_and(|b| b <= h);
        if !fits_x || !fits_y {
            return Err(TransformError::invalid(
                "extract",
                format!(
                    "area {}x{}+{}+{} lies outside the {}x{} image",
                    self.width, self.height, self.left, self.top, w, h
                ),
            ));
        }
        Ok(image.crop_imm(self.left, self.top, self.width, self.height))
    }
}

// ============================================================================
// Trim
// ============================================================================

/// Where the trim reference color comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimReference {
    /// The top-left pixel of the image.
    TopLeftPixel,
    /// An explicit background color.
    Background(Color),
}

/// Remove edges that match a reference color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trim {
    pub reference: TrimReference,
    /// Largest per-channel difference still counted as background.
    pub threshold: f64,
}

impl Trim {
    /// Bounding box `(left, top, width, height)` of pixels that differ
    /// from the reference, or `None` when every pixel matches.
    fn content_bounds(&self, rgba: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
        let reference = match self.reference {
            TrimReference::TopLeftPixel => *rgba.get_pixel(0, 0),
            TrimReference::Background(color) => color.to_rgba(),
        };

        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, pixel) in rgba.enumerate_pixels() {
            let diff = pixel
                .0
                .iter()
                .zip(reference.0.iter())
                .map(|(a, b)| a.abs_diff(*b))
                .max()
                .unwrap_or(0);
            if f64::from(diff) > self.threshold {
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        bounds.map(|(x0, y0, x1, y1)| (x0, y0, x1 - x0 + 1, y1 - y0 + 1))
    }
}

impl Transform for Trim {
    fn name(&self) -> &'static str {
        "trim"
    }

    fn apply(&self, image: DynamicImage) -> TransformResult<DynamicImage> {
        if self.threshold.is_nan() || self.threshold < 0.0 {
            return Err(TransformError::invalid("threshold", "must be zero or positive"));
        }
        if image.width() == 0 || image.height() == 0 {
            return Ok(image);
        }

        match self.content_bounds(&image.to_rgba8()) {
            Some((x, y, w, h)) => Ok(image.crop_imm(x, y, w, h)),
            None => Ok(image),
        }
    }
}

// ============================================================================
// Extend
// ============================================================================

/// How new edge pixels are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendMode {
    Background,
    Copy,
    Repeat,
    Mirror,
}

impl FromStr for ExtendMode {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "background" => Ok(ExtendMode::Background),
            "copy" => Ok(ExtendMode::Copy),
            "repeat" => Ok(ExtendMode::Repeat),
            "mirror" => Ok(ExtendMode::Mirror),
            other => Err(TransformError::invalid(
                "extendWith",
                format!("unknown extend mode '{}'", other),
            )),
        }
    }
}

impl ExtendMode {
    /// Source coordinate for output coordinate `pos` shifted by the edge
    /// width, or `None` when the pixel takes the background.
    fn source(&self, pos: i64, len: u32) -> Option<u32> {
        let len = i64::from(len);
        if (0..len).contains(&pos) {
            return Some(pos as u32);
        }
        let mapped = match self {
            ExtendMode::Background => return None,
            ExtendMode::Copy => pos.clamp(0, len - 1),
            ExtendMode::Repeat => pos.rem_euclid(len),
            ExtendMode::Mirror => {
                let m = pos.rem_euclid(2 * len);
                if m >= len {
                    2 * len - 1 - m
                } else {
                    m
                }
            }
        };
        Some(mapped as u32)
    }
}

/// Add pixels to the edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extend {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
    pub mode: ExtendMode,
    pub background: Color,
}

impl Transform for Extend {
    fn name(&self) -> &'static str {
        "extend"
    }

    fn apply(&self, image: DynamicImage) -> TransformResult<DynamicImage> {
        if self.top == 0 && self.bottom == 0 && self.left == 0 && self.right == 0 {
            return Ok(image);
        }

        let color = image.color();
        let (w, h) = image.dimensions();
        let out_w = w
            .checked_add(self.left)
            .and_then(|v| v.checked_add(self.right))
            .ok_or_else(|| TransformError::invalid("extend", "width overflows"))?;
        let out_h = h
            .checked_add(self.top)
            .and_then(|v| v.checked_add(self.bottom))
            .ok_or_else(|| TransformError::invalid("extend", "height overflows"))?;
        if w == 0 || h == 0 {
            return Err(TransformError::invalid("extend", "source image is empty"));
        }
        check_output_size("extend", out_w, out_h)?;

        let src = image.to_rgba8();
        let fill = self.background.to_rgba();
        let out = RgbaImage::from_fn(out_w, out_h, |x, y| {
            let sx = self.mode.source(i64::from(x) - i64::from(self.left), w);
            let sy = self.mode.source(i64::from(y) - i64::from(self.top), h);
            match (sx, sy) {
                (Some(sx), Some(sy)) => *src.get_pixel(sx, sy),
                _ => fill,
            }
        });
        Ok(restore_color(out, color))
    }
}

// ============================================================================
// Resize
// ============================================================================

/// How the image fits the requested box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    /// Fill the box, cropping overflow.
    Cover,
    /// Fit inside the box, letterboxing with the background.
    Contain,
    /// Stretch to the exact box.
    Fill,
    /// Fit inside the box; output may be smaller.
    Inside,
    /// Cover the box; output may be larger.
    Outside,
}

impl FromStr for Fit {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cover" => Ok(Fit::Cover),
            "contain" => Ok(Fit::Contain),
            "fill" => Ok(Fit::Fill),
            "inside" => Ok(Fit::Inside),
            "outside" => Ok(Fit::Outside),
            other => Err(TransformError::invalid("fit", format!("unknown fit '{}'", other))),
        }
    }
}

/// Resampling kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
    Nearest,
    Cubic,
    Mitchell,
    Lanczos2,
    Lanczos3,
}

impl Kernel {
    fn filter(&self) -> FilterType {
        match self {
            Kernel::Nearest => FilterType::Nearest,
            Kernel::Cubic | Kernel::Mitchell => FilterType::CatmullRom,
            Kernel::Lanczos2 | Kernel::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl FromStr for Kernel {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearest" => Ok(Kernel::Nearest),
            "cubic" => Ok(Kernel::Cubic),
            "mitchell" => Ok(Kernel::Mitchell),
            "lanczos2" => Ok(Kernel::Lanczos2),
            "lanczos3" => Ok(Kernel::Lanczos3),
            other => Err(TransformError::invalid(
                "kernel",
                format!("unknown kernel '{}'", other),
            )),
        }
    }
}

/// Largest width or height a resize may target.
pub const MAX_DIMENSION: u32 = 8192;

/// Resize to a target box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resize {
    pub width: u32,
    pub height: u32,
    pub fit: Fit,
    pub position: Gravity,
    pub background: Color,
    pub kernel: Kernel,
    pub without_enlargement: bool,
    /// Accepted for compatibility; decoding always happens at full size.
    pub fast_shrink_on_load: bool,
}

impl Resize {
    fn scaled(&self, (w, h): (u32, u32), scale: f64) -> (u32, u32) {
        (
            ((w as f64 * scale).round() as u32).max(1),
            ((h as f64 * scale).round() as u32).max(1),
        )
    }
}

impl Transform for Resize {
    fn name(&self) -> &'static str {
        "resize"
    }

    fn apply(&self, image: DynamicImage) -> TransformResult<DynamicImage> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if !(1..=MAX_DIMENSION).contains(&value) {
                return Err(TransformError::invalid(
                    name,
                    format!("must be within [1, {}]", MAX_DIMENSION),
                ));
            }
        }
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Err(TransformError::invalid("resize", "source image is empty"));
        }
        if self.without_enlargement && w <= self.width && h <= self.height {
            return Ok(image);
        }

        let filter = self.kernel.filter();
        let sx = self.width as f64 / w as f64;
        let sy = self.height as f64 / h as f64;

        match self.fit {
            Fit::Fill => Ok(image.resize_exact(self.width, self.height, filter)),
            Fit::Inside => {
                let (nw, nh) = self.scaled((w, h), sx.min(sy));
                Ok(image.resize_exact(nw, nh, filter))
            }
            Fit::Outside => {
                let (nw, nh) = self.scaled((w, h), sx.max(sy));
                check_output_size("resize", nw, nh)?;
                Ok(image.resize_exact(nw, nh, filter))
            }
            Fit::Cover => {
                let (nw, nh) = self.scaled((w, h), sx.max(sy));
                let (nw, nh) = (nw.max(self.width), nh.max(self.height));
                check_output_size("resize", nw, nh)?;
                let resized = image.resize_exact(nw, nh, filter);
                let (x, y) = self
                    .position
                    .offset((nw, nh), (self.width, self.height));
                Ok(resized.crop_imm(x as u32, y as u32, self.width, self.height))
            }
            Fit::Contain => {
                let color = image.color();
                let (nw, nh) = self.scaled((w, h), sx.min(sy));
                let (nw, nh) = (nw.min(self.width), nh.min(self.height));
                let resized = image.resize_exact(nw, nh, filter).to_rgba8();
                let mut canvas =
                    RgbaImage::from_pixel(self.width, self.height, self.background.to_rgba());
                let (x, y) = self
                    .position
                    .offset((self.width, self.height), (nw, nh));
                imageops::overlay(&mut canvas, &resized, x, y);
                Ok(restore_color(canvas, color))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn rgb(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            Rgb([(x * 10) as u8, (y * 10) as u8, 0])
        }))
    }

    #[test]
    fn test_gravity_offsets() {
        assert_eq!(Gravity::NorthEast.offset((100, 50), (10, 10)), (90, 0));
        assert_eq!(Gravity::Centre.offset((100, 50), (10, 10)), (45, 20));
        assert_eq!(Gravity::SouthWest.offset((100, 50), (10, 10)), (0, 40));
        assert_eq!("center".parse::<Gravity>().unwrap(), Gravity::Centre);
        assert!("up".parse::<Gravity>().is_err());
    }

    #[test]
    fn test_rotate_right_angles() {
        let rotate = Rotate::new(90.0, Color::BLACK);
        let out = rotate.apply(rgb(20, 10)).unwrap();
        assert_eq!(out.dimensions(), (10, 20));

        let out = Rotate::new(180.0, Color::BLACK).apply(rgb(20, 10)).unwrap();
        assert_eq!(out.dimensions(), (20, 10));

        let out = Rotate::new(-90.0, Color::BLACK).apply(rgb(20, 10)).unwrap();
        assert_eq!(out.dimensions(), (10, 20));

        let out = Rotate::new(0.0, Color::BLACK).apply(rgb(20, 10)).unwrap();
        assert_eq!(out.dimensions(), (20, 10));
    }

    #[test]
    fn test_rotate_arbitrary_expands_canvas() {
        let out = Rotate::new(45.0, Color::WHITE).apply(rgb(10, 10)).unwrap();
        assert_eq!(out.dimensions(), (14, 14));
        let corner = out.to_rgba8().get_pixel(0, 0).0;
        assert_eq!(corner, [255, 255, 255, 255]);
    }

    #[test]
    fn test_rotate_annotation() {
        let meta = Rotate::new(90.0, Color::BLACK).annotations();
        assert_eq!(meta["rotation"], json!(90));
        let meta = Rotate::new(22.5, Color::BLACK).annotations();
        assert_eq!(meta["rotation"], json!(22.5));
    }

    #[test]
    fn test_extract_bounds() {
        let crop = Extract { left: 2, top: 3, width: 4, height: 5 };
        assert_eq!(crop.apply(rgb(10, 10)).unwrap().dimensions(), (4, 5));

        let outside = Extract { left: 8, top: 0, width: 4, height: 5 };
        assert!(matches!(
            outside.apply(rgb(10, 10)),
            Err(TransformError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_trim_removes_uniform_border() {
        let mut img = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        for x in 3..6 {
            for y in 4..8 {
                img.put_pixel(x, y, Rgb([200, 200, 200]));
            }
        }
        let trim = Trim { reference: TrimReference::TopLeftPixel, threshold: 10.0 };
        let out = trim.apply(DynamicImage::ImageRgb8(img.clone())).unwrap();
        assert_eq!(out.dimensions(), (3, 4));

        let trim = Trim {
            reference: TrimReference::Background(Color::WHITE),
            threshold: 10.0,
        };
        let out = trim.apply(DynamicImage::ImageRgb8(img)).unwrap();
        assert_eq!(out.dimensions(), (10, 10));
    }

    #[test]
    fn test_trim_uniform_image_is_unchanged() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 5, Rgb([7, 7, 7])));
        let trim = Trim { reference: TrimReference::TopLeftPixel, threshold: 10.0 };
        assert_eq!(trim.apply(img).unwrap().dimensions(), (5, 5));
    }

    #[test]
    fn test_extend_modes() {
        let extend = Extend {
            top: 0,
            bottom: 0,
            left: 10,
            right: 5,
            mode: ExtendMode::Background,
            background: Color::BLACK,
        };
        let out = extend.apply(rgb(100, 20)).unwrap();
        assert_eq!(out.dimensions(), (115, 20));

        assert_eq!(ExtendMode::Copy.source(-3, 4), Some(0));
        assert_eq!(ExtendMode::Repeat.source(-1, 4), Some(3));
        assert_eq!(ExtendMode::Mirror.source(-1, 4), Some(0));
        assert_eq!(ExtendMode::Mirror.source(5, 4), Some(2));
        assert_eq!(ExtendMode::Background.source(4, 4), None);
    }

    #[test]
    fn test_extend_rejects_huge_output() {
        let extend = Extend {
            top: 0,
            bottom: 0,
            left: 3_000_000_000,
            right: 0,
            mode: ExtendMode::Background,
            background: Color::BLACK,
        };
        assert!(matches!(
            extend.apply(rgb(10, 10)),
            Err(TransformError::InvalidParameter { .. })
        ));

        let tall = Extend { left: 0, bottom: 20_000, ..extend };
        assert!(tall.apply(rgb(20_000, 1)).is_err());
    }

    #[test]
    fn test_extend_mirror_pixels() {
        let src = rgb(4, 1);
        let extend = Extend {
            top: 0,
            bottom: 0,
            left: 2,
            right: 0,
            mode: ExtendMode::Mirror,
            background: Color::BLACK,
        };
        let out = extend.apply(src).unwrap().to_rgb8();
        assert_eq!(out.get_pixel(0, 0).0[0], 10);
        assert_eq!(out.get_pixel(1, 0).0[0], 0);
        assert_eq!(out.get_pixel(2, 0).0[0], 0);
    }

    fn resize(width: u32, height: u32, fit: Fit) -> Resize {
        Resize {
            width,
            height,
            fit,
            position: Gravity::Centre,
            background: Color::BLACK,
            kernel: Kernel::Lanczos3,
            without_enlargement: false,
            fast_shrink_on_load: true,
        }
    }

    #[test]
    fn test_resize_fits() {
        let src = rgb(40, 20);
        let dims = |fit| resize(10, 10, fit).apply(src.clone()).unwrap().dimensions();

        assert_eq!(dims(Fit::Cover), (10, 10));
        assert_eq!(dims(Fit::Contain), (10, 10));
        assert_eq!(dims(Fit::Fill), (10, 10));
        assert_eq!(dims(Fit::Inside), (10, 5));
        assert_eq!(dims(Fit::Outside), (20, 10));
    }

    #[test]
    fn test_resize_without_enlargement() {
        let mut op = resize(100, 100, Fit::Fill);
        op.without_enlargement = true;
        assert_eq!(op.apply(rgb(40, 20)).unwrap().dimensions(), (40, 20));
    }

    #[test]
    fn test_resize_dimension_bounds() {
        let src = rgb(4, 4);
        assert_eq!(resize(8192, 1, Fit::Fill).apply(src.clone()).unwrap().dimensions(), (8192, 1));
        assert!(matches!(
            resize(8193, 10, Fit::Fill).apply(src.clone()),
            Err(TransformError::InvalidParameter { .. })
        ));
        assert!(resize(10, 0, Fit::Fill).apply(src.clone()).is_err());
        assert!(resize(3_000_000_000, 10, Fit::Cover).apply(src).is_err());
    }

    #[test]
    fn test_resize_outside_bounds_intermediate() {
        let strip = rgb(1, 4000);
        assert!(resize(8000, 10, Fit::Outside).apply(strip.clone()).is_err());
        assert!(resize(8000, 10, Fit::Cover).apply(strip).is_err());
    }

    #[test]
    fn test_resize_parsing() {
        assert_eq!("mitchell".parse::<Kernel>().unwrap().filter(), FilterType::CatmullRom);
        assert!("bicubic".parse::<Kernel>().is_err());
        assert!("stretch".parse::<Fit>().is_err());
    }
}
