//! Upload service that stores files in a local directory.
//!
//! Used by the session runner so uploads can be replayed without a
//! media server. Each file is stored under a fresh UUID name and
//! becomes a `file://` descriptor; the uploaded name is kept in the
//! descriptor's `filename` field.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use url::Url;
use uuid::Uuid;

use blockfields_core::{FileBlob, MediaDescriptor};
use blockfields_media::{UploadError, UploadRequest, UploadService};

/// Copies uploaded files into `root`.
#[derive(Debug, Clone)]
pub struct DirectoryUploadService {
    root: PathBuf,
}

impl DirectoryUploadService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl UploadService for DirectoryUploadService {
    async fn upload(&self, request: UploadRequest) -> Result<Vec<MediaDescriptor>, UploadError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let root = tokio::fs::canonicalize(&self.root).await?;

        let mut stored = Vec::with_capacity(request.files.len());
        for file in request.files {
            if !request.kind.accepts(&file.mime) {
                tracing::warn!(
                    "Skipping {} ({}): not a {} file",
                    file.name,
                    file.mime,
                    request.kind
                );
                continue;
            }

            let original = Path::new(&file.name)
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| UploadError::Rejected(format!("invalid file name: {}", file.name)))?
                .to_string();
            let target = root.join(stored_name(&original));
            tokio::fs::write(&target, &file.bytes).await?;
            tracing::debug!("Stored upload {} at {}", original, target.display());

            let url = Url::from_file_path(&target).map_err(|()| {
                UploadError::Rejected(format!("not an absolute path: {}", target.display()))
            })?;
            stored.push(
                MediaDescriptor::from_url(url)
                    .with_field("filename", original)
                    .with_field("mime", file.mime)
                    .with_field("filesize", file.bytes.len()),
            );
        }
        Ok(stored)
    }
}

/// A collision-free name that keeps the upload's extension.
fn stored_name(original: &str) -> String {
    match Path::new(original).extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_ascii_lowercase()),
        None => Uuid::new_v4().to_string(),
    }
}

/// Reads files from disk into blobs, guessing MIME types from extensions.
pub async fn load_files(paths: &[PathBuf]) -> std::io::Result<Vec<FileBlob>> {
    let mut blobs = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();
        blobs.push(FileBlob::new(name, mime_for(path), bytes));
    }
    Ok(blobs)
}

/// MIME type for a file extension.
pub fn mime_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "ogv" => "video/ogg",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "ogg" | "oga" => "audio/ogg",
        "wav" => "audio/wav",
        _ => "application/octet-stream",
    }
}
