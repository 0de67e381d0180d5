//! Profile picture payloads.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{CityPulseError, Result};

/// An image picked by the user, ready to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePictureUpload {
    pub bytes: Vec<u8>,
    /// File extension without the dot (`jpg`, `png`, ...).
    pub extension: String,
    pub content_type: Option<String>,
}

impl ProfilePictureUpload {
    pub fn new(bytes: Vec<u8>, extension: impl Into<String>) -> Self {
        Self {
            bytes,
            extension: normalize_extension(&extension.into()),
            content_type: None,
        }
    }

    /// Image pickers hand out base64; decode it here.
    pub fn from_base64(data: &str, extension: impl Into<String>) -> Result<Self> {
        let bytes = STANDARD.decode(data.trim())?;
        Ok(Self::new(bytes, extension))
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Explicit content type, else guessed from the extension, else `image/{ext}`.
    pub fn resolved_content_type(&self) -> String {
        if let Some(content_type) = &self.content_type {
            return content_type.clone();
        }
        mime_guess::from_ext(&self.extension)
            .first()
            .map(|mime| mime.to_string())
            .unwrap_or_else(|| format!("image/{}", self.extension))
    }

    /// Object key: `{identity_id}-{unix_millis}.{ext}`.
    pub fn object_key(&self, identity_id: &str, unix_millis: i64) -> String {
        format!("{identity_id}-{unix_millis}.{}", self.extension)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bytes.is_empty() {
            return Err(CityPulseError::invalid_input("profile picture is empty"));
        }
        Ok(())
    }
}

fn normalize_extension(raw: &str) -> String {
    let ext = raw.trim().trim_start_matches('.').to_ascii_lowercase();
    if ext.is_empty() { "jpg".to_string() } else { ext }
}
