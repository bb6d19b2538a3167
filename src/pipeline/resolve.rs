//! Ticket to handle resolution.

use crate::core::context::ExecutionContext;
use crate::core::error::StoreResult;
use crate::core::types::{ImageHandle, ImageRef};
use crate::store::ContentStore;

/// Fetch one referenced object. Read-only.
pub fn resolve(store: &dyn ContentStore, reference: &ImageRef) -> StoreResult<ImageHandle> {
    store.get(&reference.ticket).map(|object| object.into_handle())
}

/// Fetch every referenced object.
///
/// Handles come back in reference order. Any failure fails the whole batch.
pub fn resolve_all(
    ctx: &ExecutionContext,
    references: Vec<ImageRef>,
) -> StoreResult<Vec<ImageHandle>> {
    log::debug!("resolving {} image reference(s)", references.len());
    ctx.fan_out(references, |reference| resolve(ctx.store(), &reference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::StoreError;
    use crate::core::types::{Meta, Ticket};
    use crate::store::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn test_resolve_keeps_order() {
        let store = Arc::new(MemoryStore::new());
        let tickets: Vec<Ticket> = (0..5u8)
            .map(|i| store.insert(vec![i], "image/png", Meta::new()))
            .collect();
        let ctx = ExecutionContext::new(store.clone());

        let refs = tickets.iter().map(|t| ImageRef::new(t.clone())).collect();
        let handles = resolve_all(&ctx, refs).unwrap();

        let firsts: Vec<u8> = handles.iter().map(|h| h.bytes().unwrap()[0]).collect();
        assert_eq!(firsts, vec![0, 1, 2, 3, 4]);
        assert_eq!(handles[2].ticket.as_ref(), Some(&tickets[2]));
    }

    #[test]
    fn test_one_missing_reference_fails_batch() {
        let store = Arc::new(MemoryStore::new());
        let a = store.insert(vec![1], "image/png", Meta::new());
        let c = store.insert(vec![3], "image/png", Meta::new());
        let ctx = ExecutionContext::new(store.clone());

        let refs = vec![ImageRef::new(a), ImageRef::from("missing"), ImageRef::new(c)];
        assert_eq!(
            resolve_all(&ctx, refs).unwrap_err(),
            StoreError::NotFound(Ticket::new("missing"))
        );
    }
}
