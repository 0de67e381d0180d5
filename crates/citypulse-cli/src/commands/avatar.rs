use anyhow::{Context, Result};
use std::path::Path;

use citypulse_core::session::ProfilePictureUpload;

use super::App;

pub async fn upload(
    app: &App,
    path: &Path,
    base64: bool,
    content_type: Option<String>,
) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_string();

    let mut upload = if base64 {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        ProfilePictureUpload::from_base64(&text, extension)?
    } else {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        ProfilePictureUpload::new(bytes, extension)
    };
    if let Some(content_type) = content_type {
        upload = upload.with_content_type(content_type);
    }

    let backend = app.backend()?;
    let (store, _) = app.signed_in(&backend).await?;
    let url = store.upload_profile_picture(upload).await?;
    app.emit(&url, |url| println!("Profile picture: {url}"))
}
