//! Core value types that flow through a component invocation.
//!
//! An invocation moves three kinds of data around:
//! - references (`ImageRef`) that arrive in and leave with the JSON payload
//! - handles (`ImageHandle`) that hold fully materialised bytes while a
//!   single operation runs
//! - metadata maps (`Meta`) that travel with every stored object

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Free-form metadata attached to a stored object.
///
/// Merges are non-destructive: keys from the right-hand side are added and
/// overwrite keys that already exist.
pub type Meta = Map<String, Value>;

/// Merge `overlay` into `base`, overwriting on conflict.
pub fn merge_meta(base: &mut Meta, overlay: &Meta) {
    for (key, value) in overlay {
        base.insert(key.clone(), value.clone());
    }
}

/// Opaque identifier of an object held by a content store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticket(String);

impl Ticket {
    /// Create a ticket from an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh random ticket.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the ticket as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Ticket {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Reference to a stored image as it appears in request and result payloads.
///
/// Only `ticket` is required on input; any other fields a host attaches to
/// a reference are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    /// Ticket of the stored object.
    pub ticket: Ticket,
    /// MIME type of the stored bytes, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Metadata recorded with the stored object.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Meta,
}

impl ImageRef {
    /// Create a bare reference to a ticket.
    pub fn new(ticket: impl Into<Ticket>) -> Self {
        Self {
            ticket: ticket.into(),
            mime_type: None,
            meta: Meta::new(),
        }
    }
}

impl From<&str> for ImageRef {
    fn from(ticket: &str) -> Self {
        Self::new(ticket)
    }
}

/// In-memory image during one invocation: bytes, MIME type and metadata.
///
/// `data` is `None` when an operation produced no binary artifact. A handle
/// without data is never written back to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHandle {
    /// Ticket the handle was resolved from or persisted under.
    pub ticket: Option<Ticket>,
    /// Encoded image bytes (raw binary, never base64).
    pub data: Option<Vec<u8>>,
    /// MIME type of `data`.
    pub mime_type: String,
    /// Metadata carried with the object.
    pub meta: Meta,
}

impl ImageHandle {
    /// Create a handle for freshly produced bytes.
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            ticket: None,
            data: Some(data),
            mime_type: mime_type.into(),
            meta: Meta::new(),
        }
    }

    /// Attach metadata.
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    /// Whether the handle holds non-empty bytes.
    pub fn has_data(&self) -> bool {
        self.data.as_ref().is_some_and(|d| !d.is_empty())
    }

    /// Borrow the bytes, if any.
    pub fn bytes(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Width recorded in the metadata.
    pub fn width(&self) -> Option<u32> {
        self.meta_u32("width")
    }

    /// Height recorded in the metadata.
    pub fn height(&self) -> Option<u32> {
        self.meta_u32("height")
    }

    fn meta_u32(&self, key: &str) -> Option<u32> {
        self.meta
            .get(key)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
    }

    /// Reference form of this handle for result payloads.
    ///
    /// Returns `None` for handles that were never stored.
    pub fn to_ref(&self) -> Option<ImageRef> {
        self.ticket.as_ref().map(|ticket| ImageRef {
            ticket: ticket.clone(),
            mime_type: Some(self.mime_type.clone()),
            meta: self.meta.clone(),
        })
    }
}

/// Supported image formats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
    Tiff,
    Bmp,
    Unknown,
}

impl ImageFormat {
    /// Map from the `image` crate's format.
    pub fn from_image_format(format: image::ImageFormat) -> Self {
        match format {
            image::ImageFormat::Jpeg => ImageFormat::Jpeg,
            image::ImageFormat::Png => ImageFormat::Png,
            image::ImageFormat::Gif => ImageFormat::Gif,
            image::ImageFormat::WebP => ImageFormat::WebP,
            image::ImageFormat::Tiff => ImageFormat::Tiff,
            image::ImageFormat::Bmp => ImageFormat::Bmp,
            _ => ImageFormat::Unknown,
        }
    }

    /// Determine the format from a MIME type such as `image/png`.
    pub fn from_mime_type(mime_type: &str) -> Self {
        image::ImageFormat::from_mime_type(mime_type)
            .map(Self::from_image_format)
            .unwrap_or(ImageFormat::Unknown)
    }

    /// Convert to the `image` crate's format.
    pub fn to_image_format(&self) -> Option<image::ImageFormat> {
        match self {
            ImageFormat::Jpeg => Some(image::ImageFormat::Jpeg),
            ImageFormat::Png => Some(image::ImageFormat::Png),
            ImageFormat::Gif => Some(image::ImageFormat::Gif),
            ImageFormat::WebP => Some(image::ImageFormat::WebP),
            ImageFormat::Tiff => Some(image::ImageFormat::Tiff),
            ImageFormat::Bmp => Some(image::ImageFormat::Bmp),
            ImageFormat::Unknown => None,
        }
    }

    /// MIME type used when storing bytes of this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Tiff => "image/tiff",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Unknown => "application/octet-stream",
        }
    }

    /// Lowercase name recorded in the `format` metadata field.
    pub fn name(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::WebP => "webp",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Unknown => "unknown",
        }
    }
}

impl Default for ImageFormat {
    fn default() -> Self {
        ImageFormat::Png
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageFormat::Jpeg => write!(f, "JPEG"),
            ImageFormat::Png => write!(f, "PNG"),
            ImageFormat::Gif => write!(f, "GIF"),
            ImageFormat::WebP => write!(f, "WebP"),
            ImageFormat::Tiff => write!(f, "TIFF"),
            ImageFormat::Bmp => write!(f, "BMP"),
            ImageFormat::Unknown => write!(f, "Unknown"),
        }
    }
}

/// RGBA color value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Create a new color from RGBA components.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create a color from RGB components (alpha = 255).
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse a color string as accepted by the `background` parameters.
    ///
    /// Accepts hex notation (see [`Color::from_hex`]) and a small set of
    /// CSS keywords.
    pub fn parse(input: &str) -> Result<Self, String> {
        let trimmed = input.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "black" => Ok(Self::BLACK),
            "white" => Ok(Self::WHITE),
            "red" => Ok(Self::RED),
            "green" | "lime" => Ok(Self::GREEN),
            "blue" => Ok(Self::BLUE),
            "gray" | "grey" => Ok(Self::rgb(128, 128, 128)),
            "transparent" => Ok(Self::TRANSPARENT),
            _ => Self::from_hex(trimmed),
        }
    }

    /// Parse a hex color string.
    ///
    /// Supports formats: "#RGB", "#RGBA", "#RRGGBB", "#RRGGBBAA"
    pub fn from_hex(hex: &str) -> Result<Self, String> {
        let hex = hex.trim_start_matches('#');
        if !hex.is_ascii() {
            return Err(format!("Invalid hex color '{}'", hex));
        }

        let nibble = |i: usize| -> Result<u8, String> {
            u8::from_str_radix(&hex[i..i + 1], 16)
                .map(|v| v * 17)
                .map_err(|e| e.to_string())
        };
        let byte = |i: usize| -> Result<u8, String> {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string())
        };

        match hex.len() {
            3 => Ok(Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
            4 => Ok(Self::new(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(format!(
                "Invalid hex color format: expected 3, 4, 6, or 8 characters, got {}",
                hex.len()
            )),
        }
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }

    /// Convert to image crate's Rgba type.
    pub fn to_rgba(&self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }

    /// Common colors
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Declared type of a schema property.
///
/// Mirrors the host's JSON-Schema vocabulary: a JSON `type` plus the
/// `x-type` refinement for image and object sequences.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ParamType {
    Number,
    Integer,
    String,
    Boolean,
    ImageArray,
    ObjectArray,
}

impl ParamType {
    /// JSON-Schema `type` keyword.
    pub fn json_type(&self) -> &'static str {
        match self {
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::String => "string",
            ParamType::Boolean => "boolean",
            ParamType::ImageArray | ParamType::ObjectArray => "object",
        }
    }

    /// Host `x-type` refinement, if any.
    pub fn x_type(&self) -> Option<&'static str> {
        match self {
            ParamType::ImageArray => Some("imageArray"),
            ParamType::ObjectArray => Some("objectArray"),
            _ => None,
        }
    }

    /// Check if a JSON value has this type.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (ParamType::Number, Value::Number(_)) => true,
            (ParamType::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (ParamType::String, Value::String(_)) => true,
            (ParamType::Boolean, Value::Bool(_)) => true,
            (ParamType::ImageArray | ParamType::ObjectArray, Value::Array(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.x_type() {
            Some(x_type) => f.write_str(x_type),
            None => f.write_str(self.json_type()),
        }
    }
}
