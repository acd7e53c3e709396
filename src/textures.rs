use base64::Engine;
use serde_json::Value;

use crate::mojang::Property;

pub const TEXTURES_PROPERTY: &str = "textures";
pub const SKIN: &str = "SKIN";

/// Decoded value of the `textures` profile property.
///
/// Only JSON syntax is enforced when decoding. The accessors walk the tree
/// and yield `None` wherever a key is missing or has an unexpected type, so
/// odd fields next to the skin entry never fail a lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDescriptor {
    raw: String,
    value: Value,
}

impl TextureDescriptor {
    /// The decoded JSON text, exactly as it was embedded in the property.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// `textures.<kind>.url`
    pub fn texture_url(&self, kind: &str) -> Option<&str> {
        self.texture(kind)?.get("url")?.as_str()
    }

    /// `textures.<kind>.metadata.model`, "slim" for the thin-armed skin.
    pub fn model(&self, kind: &str) -> Option<&str> {
        self.texture(kind)?.get("metadata")?.get("model")?.as_str()
    }

    pub fn profile_name(&self) -> Option<&str> {
        self.value.get("profileName")?.as_str()
    }

    fn texture(&self, kind: &str) -> Option<&Value> {
        self.value.get("textures")?.get(kind)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TextureDecodeError {
    #[error("textures property is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("textures property is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("textures property is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decodes the first property named `textures`; later duplicates are ignored.
/// `Ok(None)` when there is no such property.
pub fn extract_texture_descriptor(
    props: &[Property],
) -> Result<Option<TextureDescriptor>, TextureDecodeError> {
    match props.iter().find(|p| p.name == TEXTURES_PROPERTY) {
        Some(prop) => decode_descriptor(&prop.value).map(Some),
        None => Ok(None),
    }
}

fn decode_descriptor(value: &str) -> Result<TextureDescriptor, TextureDecodeError> {
    // STANDARD rejects non-alphabet bytes and non-canonical trailing bits
    let bytes = base64::engine::general_purpose::STANDARD.decode(value)?;
    let raw = String::from_utf8(bytes)?;
    let value = serde_json::from_str(&raw)?;
    Ok(TextureDescriptor { raw, value })
}

pub fn skin_url(descriptor: &TextureDescriptor) -> Option<&str> {
    descriptor.texture_url(SKIN)
}
