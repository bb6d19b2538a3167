//! Blur component.

use super::{documented, images_in, images_out};
use crate::core::context::{ExecutionContext, Payload};
use crate::core::error::ComponentResult;
use crate::core::node::{Category, Component, ComponentSchema};
use crate::core::port::{ParameterDefinition, UiHint};
use crate::core::types::ParamType;
use crate::ops::Blur;
use crate::pipeline::transform_images;
use serde_json::json;

/// Blurs images with a box or Gaussian kernel.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlurComponent;

impl Component for BlurComponent {
    fn schema(&self) -> ComponentSchema {
        documented(
            ComponentSchema::builder("blur", "Blur Image"),
            "https://docs.rs/imageproc/latest/imageproc/filter/fn.gaussian_blur_f32.html",
        )
        .category(Category::Blur)
        .description("Blur images. A sigma of 0 performs a fast 3x3 box blur; a positive sigma performs a Gaussian blur with sigma clamped to 0.3..1000.")
        .input(images_in("The image(s) to blur"))
        .output(images_out("The blurred images"))
        .parameter(
            ParameterDefinition::new("sigma", ParamType::Number, json!(0))
                .with_display_name("Sigma")
                .with_description("0 for a fast blur, 0.3-1000 for a Gaussian blur")
                .with_range(0.0, 3000.0)
                .with_ui_hint(UiHint::SpinBox),
        )
        .build()
    }

    fn execute(&self, payload: Payload, ctx: &ExecutionContext) -> ComponentResult<Payload> {
        transform_images(payload, ctx, |p| {
            Ok(Blur::from_sigma(p.get_float("sigma").unwrap_or(0.0))?)
        })
    }
}
