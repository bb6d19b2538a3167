//! # Pixelblocks - Image components for workflow hosts
//!
//! Pixelblocks publishes a set of image-processing components (rotate,
//! blur, tint, resize, composite and more) to a workflow host. Every
//! component runs the same straight-line pipeline over a batch of images:
//!
//! 1. resolve each ticket in the payload to bytes held by a content store
//! 2. apply exactly one operation per image
//! 3. re-derive header metadata from the new bytes
//! 4. write the result back as a new temporary object
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pixelblocks::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let ticket = store.insert(std::fs::read("input.png")?, "image/png", Meta::new());
//!
//! let registry = ComponentRegistry::with_builtins();
//! let ctx = ExecutionContext::new(store.clone()).with_user(UserIdentity::new("alice"));
//!
//! let payload = Payload::new()
//!     .with("images", json!([{ "ticket": ticket }]))
//!     .with("angle", 90);
//! let result = registry.invoke("rotate", payload, &ctx)?;
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: value types, payloads, schemas and error handling
//! - [`store`]: the content store abstraction and an in-memory store
//! - [`ops`]: the pixel operations and the codec
//! - [`pipeline`]: resolve, refresh metadata and persist
//! - [`components`]: the built-in components
//! - [`registry`]: the published component table

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod components;
pub mod core;
pub mod ops;
pub mod pipeline;
pub mod registry;
pub mod store;

#[cfg(test)]
mod test_support;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use pixelblocks::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::types::{Color, ImageFormat, ImageHandle, ImageRef, Meta, ParamType, Ticket};

    // Components and schemas
    pub use crate::core::node::{Category, Component, ComponentSchema, NAMESPACE};
    pub use crate::core::port::{Constraint, ParameterDefinition, PortDefinition, UiHint};

    // Contexts
    pub use crate::core::context::{ExecutionContext, Payload, UserIdentity};

    // Errors
    pub use crate::core::error::{
        ComponentError, ComponentResult, PayloadError, StoreError, TransformError,
    };

    // Store
    pub use crate::store::{ContentStore, MemoryStore, PutOptions, StoreOptions, StoredObject};

    // Pipeline
    pub use crate::pipeline::{ExecutionOptions, ImageInfo};

    // Registry
    pub use crate::registry::{build_descriptor, ComponentRegistry, Descriptor};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "pixelblocks");
    }

    #[test]
    fn test_chained_invocations() {
        let store = Arc::new(MemoryStore::new());
        let refs = crate::test_support::seed(&store, &[(40, 30)]);
        let registry = ComponentRegistry::with_builtins();
        let ctx = ExecutionContext::new(store.clone()).with_user(UserIdentity::new("alice"));

        let payload = Payload::new().with("images", serde_json::to_value(refs).unwrap());
        let rotated = registry.invoke("rotate", payload, &ctx).unwrap();
        let resized = registry
            .invoke("resize", rotated.with("width", 15).with("height", 20), &ctx)
            .unwrap();
        let metadata = registry.invoke("metadata", resized, &ctx).unwrap();

        let report = &metadata.get("metadata").unwrap()[0];
        assert_eq!(report["width"], json!(15));
        assert_eq!(report["height"], json!(20));
        assert_eq!(report["rotation"], json!(90));
        assert_eq!(report["user"], json!("alice"));
    }
}
