//! Blur: a fast 3x3 box blur or a Gaussian blur.

use super::{restore_color, Transform};
use crate::core::error::{TransformError, TransformResult};
use image::{DynamicImage, Pixel};
use imageproc::definitions::Image;

/// Smallest sigma forwarded to the Gaussian kernel.
pub const MIN_SIGMA: f32 = 0.3;
/// Largest sigma forwarded to the Gaussian kernel.
pub const MAX_SIGMA: f32 = 1000.0;

/// Blur operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Blur {
    /// 3x3 box blur; takes no sigma.
    Fast,
    /// Gaussian blur with a sigma already clamped into range.
    Gaussian { sigma: f32 },
}

impl Blur {
    /// Plan a blur from a requested sigma.
    ///
    /// Zero selects the fast box blur. Positive values are clamped into
    /// `[MIN_SIGMA, MAX_SIGMA]`.
    pub fn from_sigma(sigma: f64) -> TransformResult<Self> {
        if sigma.is_nan() || sigma < 0.0 {
            return Err(TransformError::invalid("sigma", "must be zero or positive"));
        }
        if sigma == 0.0 {
            return Ok(Blur::Fast);
        }
        Ok(Blur::Gaussian {
            sigma: (sigma as f32).clamp(MIN_SIGMA, MAX_SIGMA),
        })
    }

    /// Sigma forwarded to the kernel, if any.
    pub fn sigma(&self) -> Option<f32> {
        match self {
            Blur::Fast => None,
            Blur::Gaussian { sigma } => Some(*sigma),
        }
    }

    fn run<P>(&self, buffer: &Image<P>) -> Image<P>
    where
        P: Pixel<Subpixel = u8>,
    {
        match self {
            Blur::Fast => {
                let kernel = [1.0f32 / 3.0; 3];
                imageproc::filter::separable_filter(buffer, &kernel, &kernel)
            }
            Blur::Gaussian { sigma } => imageproc::filter::gaussian_blur_f32(buffer, *sigma),
        }
    }
}

impl Transform for Blur {
    fn name(&self) -> &'static str {
        "blur"
    }

    fn apply(&self, image: DynamicImage) -> TransformResult<DynamicImage> {
        let color = image.color();
        // Opaque layouts are blurred without an alpha channel so rounding
        // in the kernel cannot introduce transparency.
        Ok(match (color.has_color(), color.has_alpha()) {
            (false, false) => DynamicImage::ImageLuma8(self.run(&image.to_luma8())),
            (true, false) => DynamicImage::ImageRgb8(self.run(&image.to_rgb8())),
            _ => restore_color(self.run(&image.to_rgba8()), color),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Luma, GrayImage};

    #[test]
    fn test_sigma_planning() {
        assert_eq!(Blur::from_sigma(0.0).unwrap(), Blur::Fast);
        assert_eq!(Blur::from_sigma(0.0).unwrap().sigma(), None);
        assert_eq!(Blur::from_sigma(500.0).unwrap().sigma(), Some(500.0));
        assert_eq!(Blur::from_sigma(5000.0).unwrap().sigma(), Some(1000.0));
        assert_eq!(Blur::from_sigma(0.1).unwrap().sigma(), Some(0.3));
        assert!(Blur::from_sigma(-1.0).is_err());
    }

    #[test]
    fn test_fast_blur_softens_edges() {
        let mut img = GrayImage::new(5, 5);
        img.put_pixel(2, 2, Luma([255]));
        let out = Blur::Fast.apply(DynamicImage::ImageLuma8(img)).unwrap();

        assert_eq!(out.dimensions(), (5, 5));
        assert_eq!(out.color(), image::ColorType::L8);
        let luma = out.to_luma8();
        assert!(luma.get_pixel(2, 2)[0] < 255);
        assert!(luma.get_pixel(1, 1)[0] > 0);
    }

    #[test]
    fn test_gaussian_blur_keeps_dimensions() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(6, 4, Luma([90])));
        let out = Blur::Gaussian { sigma: 2.0 }.apply(img).unwrap();
        assert_eq!(out.dimensions(), (6, 4));
    }
}
