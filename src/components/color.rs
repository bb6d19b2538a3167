//! Color components: tint, grayscale and modulate.

use super::{documented, images_in, images_out};
use crate::core::context::{ExecutionContext, Payload};
use crate::core::error::ComponentResult;
use crate::core::node::{Category, Component, ComponentSchema};
use crate::core::port::{ParameterDefinition, UiHint};
use crate::core::types::ParamType;
use crate::ops::{Grayscale, Modulate, Tint};
use crate::pipeline::transform_images;
use serde_json::json;

/// Tints images with an RGB color, keeping luminance.
#[derive(Debug, Clone, Copy, Default)]
pub struct TintComponent;

impl Component for TintComponent {
    fn schema(&self) -> ComponentSchema {
        let mut builder = documented(
            ComponentSchema::builder("tint", "Tint Image"),
            "https://docs.rs/image/latest/image/struct.Rgba.html",
        )
        .category(Category::Color)
        .description("Tint images using the chroma of an RGB colour while preserving their luminance.")
        .input(images_in("The image(s) to tint"))
        .output(images_out("The tinted images"));

        for name in ["red", "green", "blue"] {
            builder = builder.parameter(
                ParameterDefinition::new(name, ParamType::Integer, json!(0))
                    .with_description(format!("Tint for the {} channel", name))
                    .with_range(0.0, 255.0),
            );
        }
        builder.build()
    }

    fn execute(&self, payload: Payload, ctx: &ExecutionContext) -> ComponentResult<Payload> {
        transform_images(payload, ctx, |p| {
            Ok(Tint {
                red: p.get_integer("red").unwrap_or(0),
                green: p.get_integer("green").unwrap_or(0),
                blue: p.get_integer("blue").unwrap_or(0),
            })
        })
    }
}

/// Converts images to grayscale.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrayscaleComponent;

impl Component for GrayscaleComponent {
    fn schema(&self) -> ComponentSchema {
        documented(
            ComponentSchema::builder("grayscale", "Grayscale Image"),
            "https://docs.rs/image/latest/image/enum.DynamicImage.html#method.grayscale",
        )
        .category(Category::Color)
        .description("Convert images to 8-bit grayscale. Any alpha channel is kept.")
        .input(images_in("The image(s) to grayscale"))
        .output(images_out("The grayscaled images"))
        .parameter(
            ParameterDefinition::new("grayscale", ParamType::Boolean, json!(true))
                .with_description("Whether to convert; false passes images through")
                .with_ui_hint(UiHint::Checkbox),
        )
        .build()
    }

    fn execute(&self, payload: Payload, ctx: &ExecutionContext) -> ComponentResult<Payload> {
        transform_images(payload, ctx, |p| {
            Ok(Grayscale {
                enabled: p.get_bool("grayscale").unwrap_or(true),
            })
        })
    }
}

/// Adjusts brightness, saturation, lightness and hue.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModulateComponent;

impl Component for ModulateComponent {
    fn schema(&self) -> ComponentSchema {
        documented(
            ComponentSchema::builder("modulate", "Modulate Image"),
            "https://docs.rs/image/latest/image/enum.DynamicImage.html#method.huerotate",
        )
        .category(Category::Color)
        .description("Transform images using brightness, saturation, lightness and hue rotation.")
        .input(images_in("The image(s) to modulate"))
        .output(images_out("The modulated images"))
        .parameter(
            ParameterDefinition::new("brightness", ParamType::Number, json!(1))
                .with_description("Brightness multiplier")
                .with_min(0.0),
        )
        .parameter(
            ParameterDefinition::new("saturation", ParamType::Number, json!(1))
                .with_description("Saturation multiplier")
                .with_min(0.0),
        )
        .parameter(
            ParameterDefinition::new("lightness", ParamType::Number, json!(0))
                .with_description("Lightness offset"),
        )
        .parameter(
            ParameterDefinition::new("hue", ParamType::Number, json!(0))
                .with_description("Hue rotation in degrees")
                .with_range(-360.0, 360.0)
                .with_ui_hint(UiHint::Angle),
        )
        .build()
    }

    fn execute(&self, payload: Payload, ctx: &ExecutionContext) -> ComponentResult<Payload> {
        transform_images(payload, ctx, |p| {
            Ok(Modulate::new(
                p.get_float("brightness").unwrap_or(1.0),
                p.get_float("saturation").unwrap_or(1.0),
                p.get_float("lightness").unwrap_or(0.0),
                p.get_float("hue").unwrap_or(0.0),
            ))
        })
    }
}
