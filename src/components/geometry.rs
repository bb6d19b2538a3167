//! Geometry components: rotate, trim, extract, extend and resize.

use super::{choice, color, documented, images_in, images_out, pixels, GRAVITIES};
use crate::core::context::{ExecutionContext, Payload};
use crate::core::error::ComponentResult;
use crate::core::node::{Category, Component, ComponentSchema};
use crate::core::port::{ParameterDefinition, UiHint};
use crate::core::types::ParamType;
use crate::ops::{Extend, Extract, Resize, Rotate, Trim, TrimReference};
use crate::pipeline::transform_images;
use serde_json::json;

/// Trim mode selecting the top-left pixel as reference.
const TOP_LEFT_PIXEL: &str = "Top left Pixel";
/// Trim mode selecting the `background` parameter as reference.
const BACKGROUND_COLOR: &str = "Background color";

/// Rotates images by an arbitrary angle.
#[derive(Debug, Clone, Copy, Default)]
pub struct RotateComponent;

impl Component for RotateComponent {
    fn schema(&self) -> ComponentSchema {
        documented(
            ComponentSchema::builder("rotate", "Rotate Image"),
            "https://docs.rs/image/latest/image/enum.DynamicImage.html#method.rotate90",
        )
        .category(Category::Transform)
        .description("Rotate images clockwise. Angles that are not a multiple of 90 expand the canvas and fill the corners with the background colour.")
        .input(images_in("The image(s) to rotate"))
        .output(images_out("The rotated images"))
        .parameter(
            ParameterDefinition::new("angle", ParamType::Number, json!(90))
                .with_display_name("Angle")
                .with_description("Angle of rotation in degrees")
                .with_range(-360.0, 360.0)
                .with_ui_hint(UiHint::Angle),
        )
        .parameter(
            ParameterDefinition::new("background", ParamType::String, json!("black"))
                .with_description("Background colour for non-right angles")
                .with_ui_hint(UiHint::ColorPicker),
        )
        .build()
    }

    fn execute(&self, payload: Payload, ctx: &ExecutionContext) -> ComponentResult<Payload> {
        transform_images(payload, ctx, |p| {
            Ok(Rotate::new(
                p.get_float("angle").unwrap_or(90.0),
                color(p, "background", "black")?,
            ))
        })
    }
}

/// Trims edges matching a reference colour.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrimComponent;

impl Component for TrimComponent {
    fn schema(&self) -> ComponentSchema {
        documented(
            ComponentSchema::builder("trim", "Trim Image"),
            "https://docs.rs/image/latest/image/struct.ImageBuffer.html",
        )
        .category(Category::Transform)
        .description("Trim pixels from all edges that are similar to the top-left pixel or to a given background colour.")
        .input(images_in("The image(s) to operate on"))
        .output(images_out("The processed images"))
        .parameter(
            ParameterDefinition::new("trimMode", ParamType::String, json!(TOP_LEFT_PIXEL))
                .with_display_name("Trim Mode")
                .with_description("Reference colour: the top-left pixel or the background colour")
                .with_choices(&[TOP_LEFT_PIXEL, BACKGROUND_COLOR]),
        )
        .parameter(
            ParameterDefinition::new("background", ParamType::String, json!("#000000"))
                .with_description("Colour to trim in 'Background color' mode")
                .with_ui_hint(UiHint::ColorPicker),
        )
        .parameter(
            ParameterDefinition::new("threshold", ParamType::Number, json!(10))
                .with_description("Allowed difference from the reference colour")
                .with_min(0.0),
        )
        .build()
    }

    fn execute(&self, payload: Payload, ctx: &ExecutionContext) -> ComponentResult<Payload> {
        transform_images(payload, ctx, |p| {
            let reference = match p.get_string("trimMode") {
                Some(BACKGROUND_COLOR) => {
                    TrimReference::Background(color(p, "background", "#000000")?)
                }
                _ => TrimReference::TopLeftPixel,
            };
            Ok(Trim {
                reference,
                threshold: p.get_float("threshold").unwrap_or(10.0),
            })
        })
    }
}

/// Crops a region out of each image.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractComponent;

impl Component for ExtractComponent {
    fn schema(&self) -> ComponentSchema {
        let mut builder = documented(
            ComponentSchema::builder("extract", "Extract Image Region"),
            "https://docs.rs/image/latest/image/enum.DynamicImage.html#method.crop_imm",
        )
        .category(Category::Transform)
        .description("Extract (crop) a region of each image.")
        .input(images_in("The image(s) to extract from"))
        .output(images_out("The processed images"));

        for (name, default) in [("left", 0), ("top", 0), ("width", 512), ("height", 512)] {
            builder = builder.parameter(
                ParameterDefinition::new(name, ParamType::Integer, json!(default))
                    .with_min(0.0)
                    .with_ui_hint(UiHint::SpinBox),
            );
        }
        builder.build()
    }

    fn execute(&self, payload: Payload, ctx: &ExecutionContext) -> ComponentResult<Payload> {
        transform_images(payload, ctx, |p| {
            Ok(Extract {
                left: pixels(p, "left", 0)?,
                top: pixels(p, "top", 0)?,
                width: pixels(p, "width", 512)?,
                height: pixels(p, "height", 512)?,
            })
        })
    }
}

/// Adds pixels to the edges of each image.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtendComponent;

impl Component for ExtendComponent {
    fn schema(&self) -> ComponentSchema {
        let mut builder = documented(
            ComponentSchema::builder("extend", "Extend Image"),
            "https://docs.rs/image/latest/image/imageops/fn.overlay.html",
        )
        .category(Category::Transform)
        .description("Extend or pad the edges of each image with a background colour or with pixels derived from the image.")
        .input(images_in("The image(s) to extend"))
        .output(images_out("The processed images"));

        for name in ["left", "top", "right", "bottom"] {
            builder = builder.parameter(
                ParameterDefinition::new(name, ParamType::Integer, json!(0))
                    .with_description(format!("Pixels to add on the {} edge", name))
                    .with_min(0.0)
                    .with_ui_hint(UiHint::SpinBox),
            );
        }
        builder
            .parameter(
                ParameterDefinition::new("extendWith", ParamType::String, json!("background"))
                    .with_display_name("Extend With")
                    .with_description("How new edge pixels are filled")
                    .with_choices(&["background", "copy", "repeat", "mirror"]),
            )
            .parameter(
                ParameterDefinition::new("background", ParamType::String, json!("#000000"))
                    .with_description("Fill colour in 'background' mode")
                    .with_ui_hint(UiHint::ColorPicker),
            )
            .build()
    }

    fn execute(&self, payload: Payload, ctx: &ExecutionContext) -> ComponentResult<Payload> {
        transform_images(payload, ctx, |p| {
            Ok(Extend {
                top: pixels(p, "top", 0)?,
                bottom: pixels(p, "bottom", 0)?,
                left: pixels(p, "left", 0)?,
                right: pixels(p, "right", 0)?,
                mode: choice(p, "extendWith", "background")?,
                background: color(p, "background", "#000000")?,
            })
        })
    }
}

/// Resizes each image to a target box.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResizeComponent;

impl Component for ResizeComponent {
    fn schema(&self) -> ComponentSchema {
        documented(
            ComponentSchema::builder("resize", "Resize Image"),
            "https://docs.rs/image/latest/image/imageops/enum.FilterType.html",
        )
        .category(Category::Transform)
        .description("Resize images to a target width and height, fitting them with the chosen strategy.")
        .input(images_in("The image(s) to resize"))
        .output(images_out("The resized images"))
        .parameter(
            ParameterDefinition::required("width", ParamType::Integer)
                .with_description("Target width in pixels")
                .with_range(1.0, 8192.0)
                .with_ui_hint(UiHint::SpinBox),
        )
        .parameter(
            ParameterDefinition::required("height", ParamType::Integer)
                .with_description("Target height in pixels")
                .with_range(1.0, 8192.0)
                .with_ui_hint(UiHint::SpinBox),
        )
        .parameter(
            ParameterDefinition::new("fit", ParamType::String, json!("cover"))
                .with_description("How the image should fit the target box")
                .with_choices(&["cover", "contain", "fill", "inside", "outside"]),
        )
        .parameter(
            ParameterDefinition::new("position", ParamType::String, json!("centre"))
                .with_description("Anchor for 'cover' and 'contain'")
                .with_choices(GRAVITIES),
        )
        .parameter(
            ParameterDefinition::new("background", ParamType::String, json!("#000000"))
                .with_description("Letterbox colour for 'contain'")
                .with_ui_hint(UiHint::ColorPicker),
        )
        .parameter(
            ParameterDefinition::new("kernel", ParamType::String, json!("lanczos3"))
                .with_description("Resampling kernel")
                .with_choices(&["nearest", "cubic", "mitchell", "lanczos2", "lanczos3"]),
        )
        .parameter(
            ParameterDefinition::new("withoutEnlargement", ParamType::Boolean, json!(false))
                .with_display_name("Without Enlargement")
                .with_description("Do not enlarge images smaller than the target box")
                .with_ui_hint(UiHint::Checkbox),
        )
        .parameter(
            ParameterDefinition::new("fastShrinkOnLoad", ParamType::Boolean, json!(true))
                .with_display_name("Fast Shrink On Load")
                .with_description("Allow shrinking during decoding")
                .with_ui_hint(UiHint::Checkbox),
        )
        .build()
    }

    fn execute(&self, payload: Payload, ctx: &ExecutionContext) -> ComponentResult<Payload> {
        transform_images(payload, ctx, |p| {
            Ok(Resize {
                width: pixels(p, "width", 0)?,
                height: pixels(p, "height", 0)?,
                fit: choice(p, "fit", "cover")?,
                position: choice(p, "position", "centre")?,
                background: color(p, "background", "#000000")?,
                kernel: choice(p, "kernel", "lanczos3")?,
                without_enlargement: p.get_bool("withoutEnlargement").unwrap_or(false),
                fast_shrink_on_load: p.get_bool("fastShrinkOnLoad").unwrap_or(true),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::UserIdentity;
    use crate::core::error::{ComponentError, TransformError};
    use crate::core::types::Meta;
    use crate::store::MemoryStore;
    use crate::test_support::{encode_png, images_of, seed, stored_dimensions};
    use std::sync::Arc;

    fn setup(sizes: &[(u32, u32)]) -> (Arc<MemoryStore>, ExecutionContext, Payload) {
        let store = Arc::new(MemoryStore::new());
        let refs = seed(&store, sizes);
        let ctx = ExecutionContext::new(store.clone()).with_user(UserIdentity::new("tester"));
        let payload = Payload::new().with("images", serde_json::to_value(refs).unwrap());
        (store, ctx, payload)
    }

    #[test]
    fn test_rotate_swaps_dimensions_and_annotates() {
        let (store, ctx, payload) = setup(&[(30, 20)]);
        let out = RotateComponent.execute(payload.with("angle", 90), &ctx).unwrap();
        let refs = images_of(&out);

        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].meta["rotation"], json!(90));
        assert_eq!(refs[0].meta["user"], json!("tester"));
        assert_eq!(refs[0].meta["width"], json!(20));
        assert_eq!(refs[0].meta["height"], json!(30));
        assert_eq!(stored_dimensions(&store, &refs[0]), (20, 30));
    }

    #[test]
    fn test_rotate_half_turn_and_zero_keep_dimensions() {
        for angle in [0, 180] {
            let (store, ctx, payload) = setup(&[(30, 20)]);
            let out = RotateComponent.execute(payload.with("angle", angle), &ctx).unwrap();
            let refs = images_of(&out);
            assert_eq!(stored_dimensions(&store, &refs[0]), (30, 20));
            assert_eq!(refs[0].meta["rotation"], json!(angle));
        }
    }

    #[test]
    fn test_rotate_without_angle_uses_default() {
        let (store, ctx, payload) = setup(&[(30, 20)]);
        let out = RotateComponent.execute(payload, &ctx).unwrap();
        assert_eq!(stored_dimensions(&store, &images_of(&out)[0]), (20, 30));
    }

    #[test]
    fn test_extend_adds_edges() {
        let (store, ctx, payload) = setup(&[(100, 40)]);
        let payload = payload.with("left", 10).with("right", 5).with("top", 0).with("bottom", 0);
        let out = ExtendComponent.execute(payload, &ctx).unwrap();
        let refs = images_of(&out);

        assert_eq!(refs[0].meta["width"], json!(115));
        assert_eq!(refs[0].meta["height"], json!(40));
        assert_eq!(stored_dimensions(&store, &refs[0]), (115, 40));
    }

    #[test]
    fn test_extract_rederives_dimensions() {
        let (_store, ctx, payload) = setup(&[(50, 50)]);
        let payload = payload
            .with("left", 5)
            .with("top", 5)
            .with("width", 20)
            .with("height", 10);
        let refs = images_of(&ExtractComponent.execute(payload, &ctx).unwrap());
        assert_eq!(refs[0].meta["width"], json!(20));
        assert_eq!(refs[0].meta["height"], json!(10));
    }

    #[test]
    fn test_extract_outside_image_is_rejected() {
        let (store, ctx, payload) = setup(&[(10, 10)]);
        let err = ExtractComponent.execute(payload, &ctx).unwrap_err();
        assert!(matches!(
            err,
            ComponentError::Transform(TransformError::InvalidParameter { .. })
        ));
        assert_eq!(store.stats().puts, 0);
    }

    #[test]
    fn test_trim_background_mode() {
        let store = Arc::new(MemoryStore::new());
        let mut img = image::RgbImage::from_pixel(10, 10, image::Rgb([0, 0, 0]));
        for x in 3..6 {
            for y in 2..8 {
                img.put_pixel(x, y, image::Rgb([255, 255, 255]));
            }
        }
        let bytes = encode_png(&image::DynamicImage::ImageRgb8(img));
        let ticket = store.insert(bytes, "image/png", Meta::new());
        let ctx = ExecutionContext::new(store.clone());

        let payload = Payload::new()
            .with("images", json!([{"ticket": ticket}]))
            .with("trimMode", BACKGROUND_COLOR)
            .with("background", "#000000");
        let refs = images_of(&TrimComponent.execute(payload, &ctx).unwrap());
        assert_eq!(stored_dimensions(&store, &refs[0]), (3, 6));
    }

    #[test]
    fn test_resize_fill() {
        let (store, ctx, payload) = setup(&[(40, 20), (8, 8)]);
        let payload = payload.with("width", 16).with("height", 12).with("fit", "fill");
        let refs = images_of(&ResizeComponent.execute(payload, &ctx).unwrap());

        assert_eq!(refs.len(), 2);
        for reference in &refs {
            assert_eq!(stored_dimensions(&store, reference), (16, 12));
        }
    }

    #[test]
    fn test_resize_bad_kernel_is_rejected() {
        let (_store, ctx, payload) = setup(&[(4, 4)]);
        let payload = payload.with("width", 2).with("height", 2).with("kernel", "box");
        assert!(ResizeComponent.execute(payload, &ctx).unwrap_err().is_transform_error());
    }

    #[test]
    fn test_schema_defaults() {
        let schema = ExtractComponent.schema();
        assert_eq!(schema.parameter_names(), vec!["left", "top", "width", "height"]);
        assert_eq!(
            schema.get_parameter("width").and_then(|p| p.default_value.clone()),
            Some(json!(512))
        );

        let schema = ResizeComponent.schema();
        assert!(schema.get_parameter("width").unwrap().required);
        assert_eq!(
            schema.get_parameter("kernel").and_then(|p| p.default_value.clone()),
            Some(json!("lanczos3"))
        );
    }
}
