//! Decoding and encoding of stored image bytes.

use crate::core::error::{TransformError, TransformResult};
use crate::core::types::ImageFormat;
use image::{ColorType, DynamicImage, ImageReader};
use std::io::Cursor;

/// Decode bytes, sniffing the container format from its magic number.
pub fn decode(bytes: &[u8]) -> TransformResult<(DynamicImage, ImageFormat)> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| TransformError::Decode(e.to_string()))?;
    let format = reader
        .format()
        .map(ImageFormat::from_image_format)
        .unwrap_or(ImageFormat::Unknown);
    let image = reader.decode()?;
    Ok((image, format))
}

/// Encode an image as `format`, falling back when `format` has no encoder.
///
/// Returns the bytes together with the format actually written, so callers
/// can keep the MIME type in step.
pub fn encode(
    image: &DynamicImage,
    format: ImageFormat,
    fallback: ImageFormat,
) -> TransformResult<(Vec<u8>, ImageFormat)> {
    let target = if format.to_image_format().is_some() {
        format
    } else {
        log::warn!("no encoder for {} output, writing {} instead", format, fallback);
        fallback
    };
    let Some(image_format) = target.to_image_format() else {
        return Err(TransformError::Unsupported(format!(
            "cannot encode as {}",
            target
        )));
    };

    let prepared = prepare_for(image, target);
    let mut buffer = Vec::new();
    prepared
        .write_to(&mut Cursor::new(&mut buffer), image_format)
        .map_err(|e| TransformError::Encode {
            format: target.to_string(),
            error: e.to_string(),
        })?;
    Ok((buffer, target))
}

/// Convert to a pixel layout the target encoder accepts.
fn prepare_for(image: &DynamicImage, format: ImageFormat) -> std::borrow::Cow<'_, DynamicImage> {
    use std::borrow::Cow;

    let color = image.color();
    let eight_bit = |img: &DynamicImage| match (color.has_color(), color.has_alpha()) {
        (true, true) => DynamicImage::ImageRgba8(img.to_rgba8()),
        (true, false) => DynamicImage::ImageRgb8(img.to_rgb8()),
        (false, true) => DynamicImage::ImageLumaA8(img.to_luma_alpha8()),
        (false, false) => DynamicImage::ImageLuma8(img.to_luma8()),
    };

    match format {
        ImageFormat::Jpeg => match color {
            ColorType::L8 | ColorType::Rgb8 => Cow::Borrowed(image),
            _ if color.has_color() => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
            _ => Cow::Owned(DynamicImage::ImageLuma8(image.to_luma8())),
        },
        ImageFormat::Gif | ImageFormat::WebP => match color {
            ColorType::Rgb8 | ColorType::Rgba8 => Cow::Borrowed(image),
            _ if color.has_alpha() => Cow::Owned(DynamicImage::ImageRgba8(image.to_rgba8())),
            _ => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
        },
        ImageFormat::Png => match color {
            ColorType::L8
            | ColorType::La8
            | ColorType::Rgb8
            | ColorType::Rgba8
            | ColorType::L16
            | ColorType::La16
            | ColorType::Rgb16
            | ColorType::Rgba16 => Cow::Borrowed(image),
            _ => Cow::Owned(eight_bit(image)),
        },
        ImageFormat::Tiff => match color {
            ColorType::L8 | ColorType::Rgb8 | ColorType::Rgba8 | ColorType::L16 => {
                Cow::Borrowed(image)
            }
            _ if color.has_alpha() => Cow::Owned(DynamicImage::ImageRgba8(image.to_rgba8())),
            _ if color.has_color() => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
            _ => Cow::Owned(DynamicImage::ImageLuma8(image.to_luma8())),
        },
        ImageFormat::Bmp | ImageFormat::Unknown => match color {
            ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => {
                Cow::Borrowed(image)
            }
            _ => Cow::Owned(eight_bit(image)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_png_round_trip_keeps_format() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, Rgb([1, 2, 3])));
        let (bytes, format) = encode(&image, ImageFormat::Png, ImageFormat::Png).unwrap();
        assert_eq!(format, ImageFormat::Png);

        let (decoded, sniffed) = decode(&bytes).unwrap();
        assert_eq!(sniffed, ImageFormat::Png);
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }

    #[test]
    fn test_jpeg_drops_alpha() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([9, 9, 9, 128])));
        let (bytes, format) = encode(&image, ImageFormat::Jpeg, ImageFormat::Png).unwrap();
        assert_eq!(format, ImageFormat::Jpeg);

        let (decoded, _) = decode(&bytes).unwrap();
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn test_unknown_format_falls_back() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        let (_, format) = encode(&image, ImageFormat::Unknown, ImageFormat::Png).unwrap();
        assert_eq!(format, ImageFormat::Png);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            decode(b"definitely not an image"),
            Err(TransformError::Decode(_))
        ));
    }
}
