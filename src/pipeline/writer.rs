//! Persistence of transformed handles as temporary objects.

use crate::core::context::ExecutionContext;
use crate::core::error::ComponentResult;
use crate::core::types::{merge_meta, ImageHandle, Meta};
use crate::pipeline::metadata::refresh_metadata;
use crate::store::PutOptions;
use serde_json::Value;

/// Write one handle back to the store under a fresh ticket.
///
/// The written metadata is the handle's own, then `annotations`, then the
/// caller's id under `user`. Handles without data are returned unchanged.
pub fn persist(
    ctx: &ExecutionContext,
    mut handle: ImageHandle,
    annotations: &Meta,
) -> ComponentResult<ImageHandle> {
    if !handle.has_data() {
        return Ok(handle);
    }
    refresh_metadata(&mut handle)?;

    let mut meta = handle.meta;
    merge_meta(&mut meta, annotations);
    let user_id = ctx.user_id().map(str::to_string);
    if ctx.options().annotate_user {
        if let Some(id) = &user_id {
            meta.insert("user".to_string(), Value::String(id.clone()));
        }
    }

    let data = handle.data.unwrap_or_default();
    let options = PutOptions::new(handle.mime_type).with_user_id(user_id);
    let stored = ctx.store().put_temp(data, options, meta)?;
    log::trace!("persisted {} ({} bytes)", stored.ticket, stored.data.len());
    Ok(stored.into_handle())
}

/// Persist every handle, keeping input order.
pub fn write_all(
    ctx: &ExecutionContext,
    handles: Vec<ImageHandle>,
    annotations: &Meta,
) -> ComponentResult<Vec<ImageHandle>> {
    log::debug!("persisting {} image(s)", handles.len());
    ctx.fan_out(handles, |handle| persist(ctx, handle, annotations))
}
