//! Composite component.

use super::{choice, documented, images_in, images_out, offset, GRAVITIES};
use crate::core::context::{ExecutionContext, Payload};
use crate::core::error::{ComponentResult, TransformError};
use crate::core::node::{Category, Component, ComponentSchema};
use crate::core::port::{ParameterDefinition, PortDefinition, UiHint};
use crate::core::types::ParamType;
use crate::ops::composite::BLEND_MODES;
use crate::ops::{codec, Composite};
use crate::pipeline::{resolve_all, transform_images, IMAGES};
use serde_json::json;

/// Payload field holding the overlay images.
pub const COMPOSITE_IMAGES: &str = "compositeImages";

/// Layers every overlay image onto every base image.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositeComponent;

impl CompositeComponent {
    /// Resolve and decode the overlays, then build the operation.
    fn build(payload: &Payload, ctx: &ExecutionContext) -> ComponentResult<Composite> {
        let refs = payload.image_refs(COMPOSITE_IMAGES)?.unwrap_or_default();
        let overlays = resolve_all(ctx, refs)?
            .into_iter()
            .map(|handle| {
                let bytes = handle.data.unwrap_or_default();
                codec::decode(&bytes).map(|(image, _)| image)
            })
            .collect::<Result<Vec<_>, TransformError>>()?;

        Ok(Composite {
            overlays,
            blend: choice(payload, "blend", "clear")?,
            gravity: choice(payload, "gravity", "northeast")?,
            top: offset(payload, "top"),
            left: offset(payload, "left"),
            tile: payload.get_bool("tile").unwrap_or(false),
            premultiplied: payload.get_bool("premultiplied").unwrap_or(false),
            density: payload.get_float("density").unwrap_or(72.0),
        })
    }
}

impl Component for CompositeComponent {
    fn schema(&self) -> ComponentSchema {
        documented(
            ComponentSchema::builder("composite", "Composite Image"),
            "https://docs.rs/image/latest/image/imageops/fn.overlay.html",
        )
        .category(Category::Composite)
        .description("Composite one or more images over each processed image, with options for blending, placement and tiling.")
        .input(images_in("Images to be processed"))
        .input(
            PortDefinition::input(COMPOSITE_IMAGES, ParamType::ImageArray)
                .with_display_name("Composite Images")
                .with_description("Images to be composited, in order"),
        )
        .output(images_out("The processed images"))
        .parameter(
            ParameterDefinition::new("blend", ParamType::String, json!("clear"))
                .with_description("How to blend each overlay with the image below")
                .with_choices(BLEND_MODES),
        )
        .parameter(
            ParameterDefinition::new("gravity", ParamType::String, json!("northeast"))
                .with_description("Where to place the overlay")
                .with_choices(GRAVITIES),
        )
        .parameter(
            ParameterDefinition::optional("top", ParamType::Integer)
                .with_description("Pixel offset from the top edge; overrides gravity"),
        )
        .parameter(
            ParameterDefinition::optional("left", ParamType::Integer)
                .with_description("Pixel offset from the left edge; overrides gravity"),
        )
        .parameter(
            ParameterDefinition::new("tile", ParamType::Boolean, json!(false))
                .with_description("Repeat the overlay across the whole image")
                .with_ui_hint(UiHint::Checkbox),
        )
        .parameter(
            ParameterDefinition::new("premultiplied", ParamType::Boolean, json!(false))
                .with_description("Treat the image below as already premultiplied")
                .with_ui_hint(UiHint::Checkbox),
        )
        .parameter(
            ParameterDefinition::new("density", ParamType::Number, json!(72))
                .with_description("DPI for vector overlays")
                .with_range(1.0, 600.0),
        )
        .build()
    }

    fn execute(&self, payload: Payload, ctx: &ExecutionContext) -> ComponentResult<Payload> {
        if !payload.contains(IMAGES) || !payload.contains(COMPOSITE_IMAGES) {
            return Ok(payload);
        }
        transform_images(payload, ctx, |p| Self::build(p, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{ComponentError, StoreError};
    use crate::store::{ContentStore, MemoryStore};
    use crate::test_support::{images_of, seed, stored_dimensions};
    use std::sync::Arc;

    #[test]
    fn test_every_overlay_lands_on_one_output() {
        let store = Arc::new(MemoryStore::new());
        let base = seed(&store, &[(20, 10)]);
        let overlays = seed(&store, &[(4, 4), (3, 3)]);
        let ctx = ExecutionContext::new(store.clone());

        let payload = Payload::new()
            .with(IMAGES, serde_json::to_value(base).unwrap())
            .with(COMPOSITE_IMAGES, serde_json::to_value(overlays).unwrap())
            .with("gravity", "centre");
        let refs = images_of(&CompositeComponent.execute(payload, &ctx).unwrap());

        assert_eq!(refs.len(), 1);
        assert_eq!(stored_dimensions(&store, &refs[0]), (20, 10));
        assert_eq!(store.stats().puts, 1);
    }

    #[test]
    fn test_one_output_per_base_image() {
        let store = Arc::new(MemoryStore::new());
        let base = seed(&store, &[(8, 8), (6, 6), (5, 9)]);
        let overlays = seed(&store, &[(2, 2)]);
        let ctx = ExecutionContext::new(store.clone());

        let payload = Payload::new()
            .with(IMAGES, serde_json::to_value(base).unwrap())
            .with(COMPOSITE_IMAGES, serde_json::to_value(overlays).unwrap())
            .with("left", 1)
            .with("tile", true);
        let refs = images_of(&CompositeComponent.execute(payload, &ctx).unwrap());

        assert_eq!(refs.len(), 3);
        assert_eq!(stored_dimensions(&store, &refs[2]), (5, 9));
    }

    #[test]
    fn test_default_blend_clears() {
        let store = Arc::new(MemoryStore::new());
        let base = seed(&store, &[(6, 4)]);
        let overlays = seed(&store, &[(2, 2)]);
        let ctx = ExecutionContext::new(store.clone());

        let payload = Payload::new()
            .with(IMAGES, serde_json::to_value(base).unwrap())
            .with(COMPOSITE_IMAGES, serde_json::to_value(overlays).unwrap());
        let refs = images_of(&CompositeComponent.execute(payload, &ctx).unwrap());

        let stored = store.get(&refs[0].ticket).unwrap();
        let out = image::load_from_memory(&stored.data).unwrap().to_rgba8();
        assert!(out.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_premultiplied_over() {
        let store = Arc::new(MemoryStore::new());
        let base = seed(&store, &[(6, 4)]);
        let overlays = seed(&store, &[(2, 2)]);
        let ctx = ExecutionContext::new(store.clone());

        let payload = Payload::new()
            .with(IMAGES, serde_json::to_value(base).unwrap())
            .with(COMPOSITE_IMAGES, serde_json::to_value(overlays).unwrap())
            .with("blend", "over")
            .with("premultiplied", true)
            .with("top", 0)
            .with("left", 0);
        let refs = images_of(&CompositeComponent.execute(payload, &ctx).unwrap());

        assert_eq!(refs.len(), 1);
        assert_eq!(stored_dimensions(&store, &refs[0]), (6, 4));
        let stored = store.get(&refs[0].ticket).unwrap();
        let out = image::load_from_memory(&stored.data).unwrap().to_rgba8();
        assert!(out.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn test_missing_overlays_is_untouched() {
        let store = Arc::new(MemoryStore::new());
        let base = seed(&store, &[(8, 8)]);
        let ctx = ExecutionContext::new(store.clone());

        let payload = Payload::new().with(IMAGES, serde_json::to_value(base).unwrap());
        let out = CompositeComponent.execute(payload.clone(), &ctx).unwrap();
        assert_eq!(out, payload);
        assert_eq!(store.stats().gets, 0);
    }

    #[test]
    fn test_missing_overlay_ticket_fails() {
        let store = Arc::new(MemoryStore::new());
        let base = seed(&store, &[(8, 8)]);
        let ctx = ExecutionContext::new(store.clone());

        let payload = Payload::new()
            .with(IMAGES, serde_json::to_value(base).unwrap())
            .with(COMPOSITE_IMAGES, json!([{"ticket": "nope"}]));
        let err = CompositeComponent.execute(payload, &ctx).unwrap_err();
        assert!(matches!(err, ComponentError::Store(StoreError::NotFound(_))));
        assert_eq!(store.stats().puts, 0);
    }

    #[test]
    fn test_schema_requires_both_sequences() {
        let doc = CompositeComponent.schema().to_json();
        assert_eq!(
            doc["operation"]["schema"]["required"],
            json!([IMAGES, COMPOSITE_IMAGES])
        );
        assert_eq!(doc["operation"]["schema"]["properties"]["blend"]["default"], json!("clear"));
    }
}
