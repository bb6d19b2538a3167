//! Core types and traits for pixelblocks.
//!
//! This module contains the foundational types every component shares:
//! - Value types (tickets, image references and handles, colors)
//! - Port and parameter definitions with their constraints
//! - The component trait and schemas
//! - Error types
//! - Payloads and execution contexts

pub mod types;
pub mod port;
pub mod error;
pub mod context;
pub mod node;

// Re-export commonly used types
pub use types::{Color, ImageFormat, ImageHandle, ImageRef, Meta, ParamType, Ticket};
pub use port::{Constraint, ParameterDefinition, PortDefinition, PortDirection, UiHint};
pub use error::{ComponentError, PayloadError, StoreError, TransformError};
pub use context::{ExecutionContext, Payload, UserIdentity};
pub use node::{Category, Component, ComponentSchema, NAMESPACE};
