//! Content store abstraction.
//!
//! Components never own image bytes between invocations. They fetch source
//! objects by ticket and write every result as a new temporary object; the
//! store is the only state shared across invocations.

mod memory;

pub use memory::{MemoryStore, StoreOptions, StoreStats};

use crate::core::error::StoreResult;
use crate::core::types::{ImageHandle, Meta, Ticket};

/// An object held by a content store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    /// Ticket the object is stored under.
    pub ticket: Ticket,
    /// Raw object bytes.
    pub data: Vec<u8>,
    /// MIME type recorded at write time.
    pub mime_type: String,
    /// Metadata recorded at write time.
    pub meta: Meta,
}

impl StoredObject {
    /// Convert into a pipeline handle.
    pub fn into_handle(self) -> ImageHandle {
        ImageHandle {
            ticket: Some(self.ticket),
            data: Some(self.data),
            mime_type: self.mime_type,
            meta: self.meta,
        }
    }
}

/// Options for a temporary write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// MIME type of the bytes.
    pub mime_type: String,
    /// Caller the object is written for, if known.
    pub user_id: Option<String>,
}

impl PutOptions {
    /// Create options for bytes of the given MIME type.
    pub fn new(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            user_id: None,
        }
    }

    /// Attribute the write to a user.
    pub fn with_user_id(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }
}

/// A get-by-ticket / put-temporary object store.
///
/// Implementations must be safe to call from several worker threads at
/// once; every `put_temp` is an independent write.
pub trait ContentStore: Send + Sync {
    /// Fetch an object by ticket.
    fn get(&self, ticket: &Ticket) -> StoreResult<StoredObject>;

    /// Store bytes under a fresh, time-limited ticket.
    fn put_temp(&self, data: Vec<u8>, options: PutOptions, meta: Meta)
        -> StoreResult<StoredObject>;
}
