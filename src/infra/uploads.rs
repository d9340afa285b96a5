//! Filesystem storage for quote-request attachments.

use std::error::Error as StdError;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use futures::{StreamExt, pin_mut, stream};
use sha2::{Digest, Sha256};
use slug::slugify;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

/// Extensions the studio can actually do something with: model and CAD
/// exchange formats, plus reference images and drawings.
const ALLOWED_EXTENSIONS: &[&str] = &[
    "stl", "obj", "3mf", "step", "stp", "iges", "igs", "zip", "png", "jpg", "jpeg", "webp", "pdf",
];

#[derive(Debug, Error)]
pub enum UploadStorageError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("file type `{extension}` is not accepted")]
    UnsupportedType { extension: String },
    #[error("uploaded file stream failed")]
    PayloadStream {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    #[error("uploaded file is empty")]
    EmptyPayload,
    #[error("uploaded file size exceeds supported range")]
    SizeOverflow,
}

/// Metadata describing a stored attachment.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub stored_path: String,
    pub content_type: String,
    pub checksum: String,
    pub size_bytes: i64,
}

/// Flat, filesystem-backed attachment store. Attachments are write-once;
/// cleanup is an operator task, not an API.
#[derive(Debug)]
pub struct UploadStorage {
    root: PathBuf,
}

impl UploadStorage {
    /// Initialise storage rooted at the provided directory, creating it
    /// if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Stream the payload to disk and return metadata for the stored file.
    pub async fn store_stream<S>(
        &self,
        original_name: &str,
        stream: S,
    ) -> Result<StoredUpload, UploadStorageError>
    where
        S: futures::Stream<Item = Result<Bytes, UploadStorageError>>,
    {
        let (stored_name, content_type) = build_stored_name(original_name)?;
        let absolute = self.resolve(&stored_name)?;

        let mut file = fs::File::create(&absolute).await?;
        let mut hasher = Sha256::new();
        let mut total_bytes: u64 = 0;
        let mut saw_payload = false;

        pin_mut!(stream);
        while let Some(chunk_result) = stream.next().await {
            let chunk = match chunk_result {
                Ok(chunk) => chunk,
                Err(err) => {
                    drop(file);
                    let _ = fs::remove_file(&absolute).await;
                    return Err(err);
                }
            };

            if chunk.is_empty() {
                continue;
            }

            saw_payload = true;
            total_bytes = total_bytes
                .checked_add(chunk.len() as u64)
                .ok_or(UploadStorageError::SizeOverflow)?;
            file.write_all(&chunk).await?;
            hasher.update(&chunk);
        }

        file.flush().await?;

        if !saw_payload {
            drop(file);
            let _ = fs::remove_file(&absolute).await;
            return Err(UploadStorageError::EmptyPayload);
        }

        let checksum = hex::encode(hasher.finalize());
        let size_bytes =
            i64::try_from(total_bytes).map_err(|_| UploadStorageError::SizeOverflow)?;

        Ok(StoredUpload {
            stored_path: stored_name,
            content_type,
            checksum,
            size_bytes,
        })
    }

    /// Store a fully-buffered payload.
    pub async fn store(
        &self,
        original_name: &str,
        data: Bytes,
    ) -> Result<StoredUpload, UploadStorageError> {
        let stream = stream::once(async move { Ok::<_, UploadStorageError>(data) });
        self.store_stream(original_name, stream).await
    }

    /// Read a stored attachment back into memory.
    pub async fn read(&self, stored_path: &str) -> Result<Bytes, UploadStorageError> {
        let absolute = self.resolve(stored_path)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    /// Resolve a stored name inside the root, rejecting traversal.
    fn resolve(&self, stored_path: &str) -> Result<PathBuf, UploadStorageError> {
        let relative = Path::new(stored_path);
        let traversal_free = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !traversal_free {
            return Err(UploadStorageError::InvalidPath);
        }
        Ok(self.root.join(relative))
    }
}

/// Unique stored name: uuid prefix plus a slugified stem, preserving the
/// (validated) extension. Returns the name and the guessed content type.
fn build_stored_name(original_name: &str) -> Result<(String, String), UploadStorageError> {
    let original = Path::new(original_name);
    let extension = original
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(UploadStorageError::UnsupportedType { extension });
    }

    let stem = original
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("attachment");
    let mut slug = slugify(stem);
    if slug.is_empty() {
        slug = "attachment".to_string();
    }

    let content_type = mime_guess::from_ext(&extension)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    Ok((
        format!("{}-{slug}.{extension}", Uuid::new_v4()),
        content_type,
    ))
}
