//! Read-only components: metadata and stats.
//!
//! Both resolve their images but never write to the store.

use super::{documented, images_in};
use crate::core::context::{ExecutionContext, Payload};
use crate::core::error::{ComponentResult, TransformError};
use crate::core::node::{Category, Component, ComponentSchema};
use crate::core::port::PortDefinition;
use crate::core::types::{merge_meta, ImageHandle, Meta, ParamType};
use crate::ops::{codec, ImageStats};
use crate::pipeline::{inspect_images, ImageInfo};

fn bytes_of(handle: &ImageHandle) -> Result<&[u8], TransformError> {
    handle
        .bytes()
        .filter(|b| !b.is_empty())
        .ok_or_else(|| TransformError::Decode("object holds no image data".to_string()))
}

/// Reports header metadata of each image.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataComponent;

impl Component for MetadataComponent {
    fn schema(&self) -> ComponentSchema {
        documented(
            ComponentSchema::builder("metadata", "Get Image Metadata"),
            "https://docs.rs/image/latest/image/trait.ImageDecoder.html",
        )
        .category(Category::Analyze)
        .description("Return the metadata of each image, read from its header without decoding pixel data.")
        .input(images_in("The image(s) to inspect"))
        .output(PortDefinition::output("metadata", ParamType::ObjectArray).with_display_name("Metadata"))
        .build()
    }

    fn execute(&self, payload: Payload, ctx: &ExecutionContext) -> ComponentResult<Payload> {
        inspect_images(payload, ctx, "metadata", |handle| {
            let info = ImageInfo::read(bytes_of(handle)?)?;
            let mut meta: Meta = handle.meta.clone();
            merge_meta(&mut meta, &info.to_meta());
            Ok(meta)
        })
    }
}

/// Reports pixel statistics of each image.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsComponent;

impl Component for StatsComponent {
    fn schema(&self) -> ComponentSchema {
        documented(
            ComponentSchema::builder("stats", "Get Image Stats"),
            "https://docs.rs/imageproc/latest/imageproc/stats/index.html",
        )
        .category(Category::Analyze)
        .description("Compute per-channel statistics, opacity, entropy and the dominant colour of each image.")
        .input(images_in("The image(s) to analyse"))
        .output(PortDefinition::output("stats", ParamType::ObjectArray).with_display_name("Stats"))
        .build()
    }

    fn execute(&self, payload: Payload, ctx: &ExecutionContext) -> ComponentResult<Payload> {
        inspect_images(payload, ctx, "stats", |handle| {
            let (image, _) = codec::decode(bytes_of(handle)?)?;
            Ok(ImageStats::compute(&image))
        })
    }
}
