//! Channel components: extract a channel, remove alpha, ensure alpha.

use super::{choice, documented, images_in, images_out};
use crate::core::context::{ExecutionContext, Payload};
use crate::core::error::ComponentResult;
use crate::core::node::{Category, Component, ComponentSchema};
use crate::core::port::ParameterDefinition;
use crate::core::types::ParamType;
use crate::ops::{EnsureAlpha, ExtractChannel, RemoveAlpha};
use crate::pipeline::transform_images;
use serde_json::json;

/// Extracts a single channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractChannelComponent;

impl Component for ExtractChannelComponent {
    fn schema(&self) -> ComponentSchema {
        documented(
            ComponentSchema::builder("extractChannel", "Extract Channel"),
            "https://docs.rs/image/latest/image/struct.Luma.html",
        )
        .category(Category::Channel)
        .description("Extract a single channel from multi-channel images.")
        .input(images_in("The image(s) to extract the channel from"))
        .output(images_out("The single-channel images"))
        .parameter(
            ParameterDefinition::new("channel", ParamType::String, json!("red"))
                .with_description("Channel to extract")
                .with_choices(&["red", "green", "blue", "alpha"]),
        )
        .build()
    }

    fn execute(&self, payload: Payload, ctx: &ExecutionContext) -> ComponentResult<Payload> {
        transform_images(payload, ctx, |p| {
            Ok(ExtractChannel {
                channel: choice(p, "channel", "red")?,
            })
        })
    }
}

/// Removes the alpha channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveAlphaComponent;

impl Component for RemoveAlphaComponent {
    fn schema(&self) -> ComponentSchema {
        documented(
            ComponentSchema::builder("removeAlpha", "Remove Alpha"),
            "https://docs.rs/image/latest/image/enum.DynamicImage.html#method.to_rgb8",
        )
        .category(Category::Channel)
        .description("Remove the alpha channel, if any. Images without alpha are left as they are.")
        .input(images_in("The image(s) to remove the alpha channel from"))
        .output(images_out("The processed images"))
        .build()
    }

    fn execute(&self, payload: Payload, ctx: &ExecutionContext) -> ComponentResult<Payload> {
        transform_images(payload, ctx, |_| Ok(RemoveAlpha))
    }
}

/// Adds an alpha channel when missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnsureAlphaComponent;

impl Component for EnsureAlphaComponent {
    fn schema(&self) -> ComponentSchema {
        documented(
            ComponentSchema::builder("ensureAlpha", "Ensure Alpha"),
            "https://docs.rs/image/latest/image/enum.DynamicImage.html#method.to_rgba8",
        )
        .category(Category::Channel)
        .description("Ensure images have an alpha channel, adding one with the given opacity when missing.")
        .input(images_in("The image(s) to process"))
        .output(images_out("The processed images"))
        .parameter(
            ParameterDefinition::new("alpha", ParamType::Number, json!(1))
                .with_description("Opacity of the added channel, 0 (transparent) to 1 (opaque)")
                .with_range(0.0, 1.0),
        )
        .build()
    }

    fn execute(&self, payload: Payload, ctx: &ExecutionContext) -> ComponentResult<Payload> {
        transform_images(payload, ctx, |p| {
            Ok(EnsureAlpha {
                alpha: p.get_float("alpha").unwrap_or(1.0),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Meta;
    use crate::store::MemoryStore;
    use crate::test_support::{images_of, rgba_png_bytes, seed};
    use std::sync::Arc;

    fn payload_for(store: &MemoryStore, bytes: Vec<u8>) -> Payload {
        let ticket = store.insert(bytes, "image/png", Meta::new());
        Payload::new().with("images", json!([{ "ticket": ticket }]))
    }

    #[test]
    fn test_extract_alpha_from_opaque_image_fails() {
        let store = Arc::new(MemoryStore::new());
        let refs = seed(&store, &[(3, 3)]);
        let ctx = ExecutionContext::new(store.clone());
        let payload = Payload::new()
            .with("images", serde_json::to_value(refs).unwrap())
            .with("channel", "alpha");

        assert!(ExtractChannelComponent
            .execute(payload, &ctx)
            .unwrap_err()
            .is_transform_error());
    }

    #[test]
    fn test_extract_channel_is_single_band() {
        let store = Arc::new(MemoryStore::new());
        let ctx = ExecutionContext::new(store.clone());
        let payload = payload_for(&store, rgba_png_bytes(2, 2)).with("channel", "alpha");

        let refs = images_of(&ExtractChannelComponent.execute(payload, &ctx).unwrap());
        assert_eq!(refs[0].meta["channels"], json!(1));
    }

    #[test]
    fn test_alpha_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let ctx = ExecutionContext::new(store.clone());

        let payload = payload_for(&store, rgba_png_bytes(2, 2));
        let removed = RemoveAlphaComponent.execute(payload, &ctx).unwrap();
        assert_eq!(images_of(&removed)[0].meta["hasAlpha"], json!(false));

        let ensured = EnsureAlphaComponent
            .execute(removed.with("alpha", 0.5), &ctx)
            .unwrap();
        let refs = images_of(&ensured);
        assert_eq!(refs[0].meta["hasAlpha"], json!(true));
        assert_eq!(refs[0].meta["channels"], json!(4));
    }

    #[test]
    fn test_ensure_alpha_out_of_range() {
        let store = Arc::new(MemoryStore::new());
        let ctx = ExecutionContext::new(store.clone());
        let payload = payload_for(&store, rgba_png_bytes(1, 1)).with("alpha", 2);
        assert!(EnsureAlphaComponent.execute(payload, &ctx).is_err());
    }
}
