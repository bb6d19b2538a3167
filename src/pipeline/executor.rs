//! The shared resolve, transform, refresh and persist harness.
//!
//! Every image-producing component runs through [`transform_images`]; the
//! introspection components run through [`inspect_images`], which resolves
//! but never writes.

use crate::core::context::{ExecutionContext, Payload};
use crate::core::error::{ComponentResult, TransformResult};
use crate::core::types::{ImageFormat, ImageHandle, ImageRef};
use crate::ops::{codec, Transform};
use crate::pipeline::options::ExecutionOptions;
use crate::pipeline::resolve::resolve_all;
use crate::pipeline::writer::write_all;
use serde::Serialize;

/// Payload field holding the source images.
pub const IMAGES: &str = "images";

/// Run the operation built by `build` over every image in `payload.images`.
///
/// Returns the payload unchanged, without touching the store, when it
/// carries no images; `build` is not called in that case. Otherwise returns
/// `{images: [...]}` with one new reference per input, in input order.
pub fn transform_images<T, F>(
    payload: Payload,
    ctx: &ExecutionContext,
    build: F,
) -> ComponentResult<Payload>
where
    T: Transform,
    F: FnOnce(&Payload) -> ComponentResult<T>,
{
    let Some(refs) = payload.image_refs(IMAGES)? else {
        return Ok(payload);
    };
    let op = build(&payload)?;
    log::debug!("{}: {} image(s)", op.name(), refs.len());

    let handles = resolve_all(ctx, refs)?;
    let transformed = ctx.fan_out(handles, |handle| apply(handle, &op, ctx.options()))?;
    let written = write_all(ctx, transformed, &op.annotations())?;

    images_payload(&written)
}

/// Apply one transform to one handle, re-encoding in the source format.
fn apply(
    mut handle: ImageHandle,
    op: &dyn Transform,
    options: &ExecutionOptions,
) -> TransformResult<ImageHandle> {
    if op.is_identity() {
        return Ok(handle);
    }
    let Some(bytes) = handle.data.as_deref() else {
        return Ok(handle);
    };

    let (image, sniffed) = codec::decode(bytes)?;
    let declared = ImageFormat::from_mime_type(&handle.mime_type);
    let target = if declared == ImageFormat::Unknown {
        sniffed
    } else {
        declared
    };

    let output = op.apply(image)?;
    let (encoded, written) = codec::encode(&output, target, options.fallback_format)?;
    if written != declared {
        handle.mime_type = written.mime_type().to_string();
    }
    handle.data = Some(encoded);
    Ok(handle)
}

/// Build `{images: [...]}` from persisted handles.
pub(crate) fn images_payload(handles: &[ImageHandle]) -> ComponentResult<Payload> {
    let refs: Vec<ImageRef> = handles.iter().filter_map(ImageHandle::to_ref).collect();
    Ok(Payload::new().with(IMAGES, serde_json::to_value(refs)?))
}

/// Resolve every image and report `f` of each under `field`. Never writes.
pub fn inspect_images<R, F>(
    payload: Payload,
    ctx: &ExecutionContext,
    field: &str,
    f: F,
) -> ComponentResult<Payload>
where
    R: Serialize + Send,
    F: Fn(&ImageHandle) -> ComponentResult<R> + Send + Sync,
{
    let Some(refs) = payload.image_refs(IMAGES)? else {
        return Ok(payload);
    };
    log::debug!("{}: {} image(s)", field, refs.len());

    let handles = resolve_all(ctx, refs)?;
    let reports = ctx.fan_out(handles, |handle| f(&handle))?;
    Ok(Payload::new().with(field, serde_json::to_value(reports)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{ComponentError, StoreError};
    use crate::core::types::Meta;
    use crate::ops::{Grayscale, Rotate};
    use crate::store::{ContentStore, MemoryStore};
    use crate::test_support::{images_of, jpeg_bytes, png_bytes, seed};
    use image::GenericImageView;
    use proptest::prelude::*;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_no_images_is_untouched() {
        let store = Arc::new(MemoryStore::new());
        let ctx = ExecutionContext::new(store.clone());
        let payload = Payload::new().with("angle", 45);

        let out = transform_images(payload.clone(), &ctx, |_| Ok(Grayscale { enabled: true })).unwrap();
        assert_eq!(out, payload);
        assert_eq!(store.stats().gets, 0);
        assert_eq!(store.stats().puts, 0);
    }

    #[test]
    fn test_output_keeps_source_format() {
        let store = Arc::new(MemoryStore::new());
        let ticket = store.insert(jpeg_bytes(8, 4), "image/jpeg", Meta::new());
        let ctx = ExecutionContext::new(store.clone());

        let payload = Payload::new().with(IMAGES, json!([{"ticket": ticket}]));
        let out = transform_images(payload, &ctx, |_| Ok(Rotate::new(90.0, Default::default()))).unwrap();
        let refs = images_of(&out);

        assert_eq!(refs[0].mime_type.as_deref(), Some("image/jpeg"));
        let stored = store.get(&refs[0].ticket).unwrap();
        let (image, format) = codec::decode(&stored.data).unwrap();
        assert_eq!(format, ImageFormat::Jpeg);
        assert_eq!(image.dimensions(), (4, 8));
    }

    fn pnm_bytes(w: u32, h: u32) -> Vec<u8> {
        let mut bytes = format!("P6\n{} {}\n255\n", w, h).into_bytes();
        bytes.extend((0..w * h * 3).map(|i| (i * 7) as u8));
        bytes
    }

    #[test]
    fn test_unencodable_source_uses_fallback_format() {
        let store = Arc::new(MemoryStore::new());
        let ticket = store.insert(pnm_bytes(3, 2), "application/octet-stream", Meta::new());

        for (fallback, mime) in [(ImageFormat::Png, "image/png"), (ImageFormat::Bmp, "image/bmp")] {
            let ctx = ExecutionContext::new(store.clone())
                .with_options(ExecutionOptions::new().with_fallback_format(fallback));
            let payload = Payload::new().with(IMAGES, json!([{"ticket": ticket}]));
            let out = transform_images(payload, &ctx, |_| Ok(Rotate::new(90.0, Default::default())))
                .unwrap();
            let refs = images_of(&out);

            assert_eq!(refs[0].mime_type.as_deref(), Some(mime));
            let stored = store.get(&refs[0].ticket).unwrap();
            assert_eq!(stored.mime_type, mime);
            let (image, format) = codec::decode(&stored.data).unwrap();
            assert_eq!(format, fallback);
            assert_eq!(image.dimensions(), (2, 3));
        }
    }

    #[test]
    fn test_identity_transform_skips_codec() {
        let store = Arc::new(MemoryStore::new());
        let bytes = png_bytes(3, 3);
        let ticket = store.insert(bytes.clone(), "image/png", Meta::new());
        let ctx = ExecutionContext::new(store.clone());

        let payload = Payload::new().with(IMAGES, json!([{"ticket": ticket}]));
        let out = transform_images(payload, &ctx, |_| Ok(Grayscale { enabled: false })).unwrap();
        let refs = images_of(&out);

        assert_eq!(store.get(&refs[0].ticket).unwrap().data, bytes);
        assert_eq!(refs[0].meta["grayscale"], json!(false));
    }

    #[test]
    fn test_missing_ticket_fails_whole_batch() {
        let store = Arc::new(MemoryStore::new());
        let a = store.insert(png_bytes(2, 2), "image/png", Meta::new());
        let c = store.insert(png_bytes(2, 2), "image/png", Meta::new());
        let ctx = ExecutionContext::new(store.clone());

        let payload = Payload::new().with(
            IMAGES,
            json!([{"ticket": a}, {"ticket": "gone"}, {"ticket": c}]),
        );
        let err = transform_images(payload, &ctx, |_| Ok(Grayscale { enabled: true })).unwrap_err();
        assert!(matches!(err, ComponentError::Store(StoreError::NotFound(_))));
        assert_eq!(store.stats().puts, 0);
    }

    #[test]
    fn test_inspect_never_writes() {
        let store = Arc::new(MemoryStore::new());
        let refs = seed(&store, &[(2, 3), (4, 5)]);
        let ctx = ExecutionContext::new(store.clone());

        let payload = Payload::new().with(IMAGES, serde_json::to_value(refs).unwrap());
        let out = inspect_images(payload, &ctx, "sizes", |h| Ok(h.bytes().map_or(0, <[u8]>::len)))
            .unwrap();

        assert_eq!(out.get("sizes").and_then(|v| v.as_array()).map(Vec::len), Some(2));
        assert_eq!(store.stats().puts, 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_output_aligned_with_input(sizes in prop::collection::vec((1u32..6, 1u32..6), 1..6)) {
            let store = Arc::new(MemoryStore::new());
            let refs = seed(&store, &sizes);
            let ctx = ExecutionContext::new(store.clone());

            let payload = Payload::new().with(IMAGES, serde_json::to_value(refs).unwrap());
            let rotate = Rotate::new(90.0, Default::default());
            let out = transform_images(payload, &ctx, |_| Ok(rotate)).unwrap();
            let outputs = images_of(&out);

            prop_assert_eq!(outputs.len(), sizes.len());
            for (reference, (w, h)) in outputs.iter().zip(&sizes) {
                let stored = store.get(&reference.ticket).unwrap();
                let (image, _) = codec::decode(&stored.data).unwrap();
                prop_assert_eq!(image.dimensions(), (*h, *w));
            }
        }
    }
}
