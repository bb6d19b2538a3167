//! The invocation pipeline: resolve, transform, refresh metadata, persist.

pub mod executor;
pub mod metadata;
pub mod options;
pub mod resolve;
pub mod writer;

pub use executor::{inspect_images, transform_images, IMAGES};
pub use metadata::{refresh_metadata, ImageInfo};
pub use options::ExecutionOptions;
pub use resolve::{resolve, resolve_all};
pub use writer::{persist, write_all};
