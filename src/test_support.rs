//! Fixtures shared by unit tests.

use crate::core::context::Payload;
use crate::core::error::{StoreError, StoreResult};
use crate::core::types::{ImageRef, Meta, Ticket};
use crate::store::{ContentStore, MemoryStore, PutOptions, StoredObject};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

/// Encode an image as PNG.
pub fn encode_png(image: &DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn gradient(w: u32, h: u32) -> RgbImage {
    RgbImage::from_fn(w, h, |x, y| {
        Rgb([(x * 255 / w.max(1)) as u8, (y * 255 / h.max(1)) as u8, 90])
    })
}

/// Opaque RGB gradient as PNG.
pub fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    encode_png(&DynamicImage::ImageRgb8(gradient(w, h)))
}

/// Half-transparent RGBA image as PNG.
pub fn rgba_png_bytes(w: u32, h: u32) -> Vec<u8> {
    encode_png(&DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        w,
        h,
        Rgba([200, 40, 40, 128]),
    )))
}

/// Opaque RGB gradient as JPEG.
pub fn jpeg_bytes(w: u32, h: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(gradient(w, h))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .unwrap();
    bytes
}

/// Store one PNG per size and return their references, in order.
pub fn seed(store: &MemoryStore, sizes: &[(u32, u32)]) -> Vec<ImageRef> {
    sizes
        .iter()
        .map(|&(w, h)| {
            let meta = serde_json::json!({"width": w, "height": h, "origin": "fixture"});
            let ticket = store.insert(
                png_bytes(w, h),
                "image/png",
                meta.as_object().cloned().unwrap(),
            );
            ImageRef::new(ticket)
        })
        .collect()
}

/// References in a result payload's `images` field.
pub fn images_of(payload: &Payload) -> Vec<ImageRef> {
    payload.image_refs("images").unwrap().unwrap_or_default()
}

/// Decoded dimensions of a stored object.
pub fn stored_dimensions(store: &MemoryStore, reference: &ImageRef) -> (u32, u32) {
    let object = store.get(&reference.ticket).unwrap();
    image::load_from_memory(&object.data).unwrap().dimensions()
}

/// Store whose reads are served from memory but whose writes always fail.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a readable object.
    pub fn insert(&self, data: Vec<u8>, mime_type: &str) -> Ticket {
        self.inner.insert(data, mime_type, Meta::new())
    }
}

impl ContentStore for FailingStore {
    fn get(&self, ticket: &Ticket) -> StoreResult<StoredObject> {
        self.inner.get(ticket)
    }

    fn put_temp(&self, _: Vec<u8>, _: PutOptions, _: Meta) -> StoreResult<StoredObject> {
        Err(StoreError::Storage("write rejected".to_string()))
    }
}
