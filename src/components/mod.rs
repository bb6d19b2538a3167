//! Built-in components.
//!
//! Each component reads its parameters from the payload, builds one
//! operation from [`crate::ops`], and hands it to the shared pipeline.

mod blur;
mod channel;
mod color;
mod composite;
mod geometry;
mod introspect;

use crate::core::context::Payload;
use crate::core::error::{TransformError, TransformResult};
use crate::core::node::ComponentSchemaBuilder;
use crate::core::port::PortDefinition;
use crate::core::types::{Color, ParamType};
use crate::ops::geometry::parse_color;
use crate::pipeline::IMAGES;
use crate::registry::ComponentRegistry;
use std::str::FromStr;

pub use blur::BlurComponent;
pub use channel::{EnsureAlphaComponent, ExtractChannelComponent, RemoveAlphaComponent};
pub use color::{GrayscaleComponent, ModulateComponent, TintComponent};
pub use composite::CompositeComponent;
pub use geometry::{
    ExtendComponent, ExtractComponent, ResizeComponent, RotateComponent, TrimComponent,
};
pub use introspect::{MetadataComponent, StatsComponent};

/// Register all built-in components, in publication order.
pub fn register_all(registry: &mut ComponentRegistry) {
    registry.register(RotateComponent);
    registry.register(TrimComponent);
    registry.register(BlurComponent);
    registry.register(TintComponent);
    registry.register(GrayscaleComponent);
    registry.register(ExtractComponent);
    registry.register(MetadataComponent);
    registry.register(StatsComponent);
    registry.register(ExtendComponent);
    registry.register(ModulateComponent);
    registry.register(ExtractChannelComponent);
    registry.register(RemoveAlphaComponent);
    registry.register(EnsureAlphaComponent);
    registry.register(ResizeComponent);
    registry.register(CompositeComponent);
}

/// Gravity names accepted by placement parameters.
pub(crate) const GRAVITIES: &[&str] = &[
    "north",
    "northeast",
    "east",
    "southeast",
    "south",
    "southwest",
    "west",
    "northwest",
    "centre",
    "center",
];

/// Required `images` input port.
fn images_in(description: &str) -> PortDefinition {
    PortDefinition::input(IMAGES, ParamType::ImageArray)
        .with_display_name("Image")
        .with_description(description)
}

/// `images` output port.
fn images_out(description: &str) -> PortDefinition {
    PortDefinition::output(IMAGES, ParamType::ImageArray)
        .with_display_name("Images")
        .with_description(description)
}

/// Attach the common documentation links plus the operation's own page.
fn documented(builder: ComponentSchemaBuilder, page: &str) -> ComponentSchemaBuilder {
    builder
        .link("Documentation", page)
        .link("image crate", "https://docs.rs/image/latest/image/")
        .link("imageproc crate", "https://docs.rs/imageproc/latest/imageproc/")
        .tags(["default"])
}

// ============================================================================
// Parameter readers
// ============================================================================

/// Read a pixel count. Fractions truncate; negatives are rejected.
fn pixels(payload: &Payload, name: &str, default: u32) -> TransformResult<u32> {
    match payload.get_integer(name) {
        None => Ok(default),
        Some(value) => u32::try_from(value)
            .map_err(|_| TransformError::invalid(name, format!("{} is not a pixel count", value))),
    }
}

/// Read an optional signed offset.
fn offset(payload: &Payload, name: &str) -> Option<i64> {
    payload.get_integer(name)
}

/// Read a color parameter.
fn color(payload: &Payload, name: &str, default: &str) -> TransformResult<Color> {
    parse_color(name, payload.get_string(name).unwrap_or(default))
}

/// Read an enumerated parameter.
fn choice<T>(payload: &Payload, name: &str, default: &str) -> TransformResult<T>
where
    T: FromStr<Err = TransformError>,
{
    payload.get_string(name).unwrap_or(default).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::Fit;
    use serde_json::json;

    #[test]
    fn test_pixels() {
        let payload = Payload::new()
            .with("left", 10.9)
            .with("top", -1)
            .with("width", "32");
        assert_eq!(pixels(&payload, "left", 0).unwrap(), 10);
        assert_eq!(pixels(&payload, "width", 0).unwrap(), 32);
        assert_eq!(pixels(&payload, "right", 7).unwrap(), 7);
        assert!(matches!(
            pixels(&payload, "top", 0),
            Err(TransformError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_color_and_choice() {
        let payload = Payload::new()
            .with("background", "#ff0000")
            .with("fit", "inside")
            .with("kernel", json!("bogus"));

        assert_eq!(color(&payload, "background", "black").unwrap(), Color::RED);
        assert_eq!(color(&payload, "missing", "black").unwrap(), Color::BLACK);
        assert_eq!(choice::<Fit>(&payload, "fit", "cover").unwrap(), Fit::Inside);
        assert!(choice::<crate::ops::Kernel>(&payload, "kernel", "lanczos3").is_err());
        assert_eq!(offset(&payload, "top"), None);
    }
}
