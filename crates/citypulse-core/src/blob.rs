//! Blob storage surface of the remote backend.

use async_trait::async_trait;

use crate::error::Result;

/// Bucket holding profile pictures.
pub const AVATAR_BUCKET: &str = "users";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub content_type: String,
    /// Overwrite an existing object under the same key.
    pub upsert: bool,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<()>;

    /// Public URL of an object. Pure; performs no request.
    fn public_url(&self, bucket: &str, key: &str) -> String;
}
