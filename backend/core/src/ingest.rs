//! Image ingestion: validates uploads and binds each accepted file to a
//! preview resource that is released exactly once.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ValidationError;

/// Largest accepted upload: 10 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Identifier of a live preview resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviewId(Uuid);

impl PreviewId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PreviewId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PreviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Bytes and MIME type behind a preview.
#[derive(Debug, Clone)]
pub struct PreviewImage {
    pub mime_type: String,
    pub bytes: Bytes,
}

/// Allocates and revokes displayable previews of uploaded images.
pub trait PreviewStore: Send + Sync {
    fn acquire(&self, bytes: Bytes, mime_type: &str) -> PreviewId;
    fn get(&self, id: PreviewId) -> Option<PreviewImage>;
    fn release(&self, id: PreviewId);
}

/// In-process preview store; the gateway serves previews out of it.
#[derive(Default)]
pub struct MemoryPreviewStore {
    previews: Mutex<HashMap<PreviewId, PreviewImage>>,
}

impl MemoryPreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of previews currently held.
    pub fn live_count(&self) -> usize {
        self.entries().len()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<PreviewId, PreviewImage>> {
        self.previews.lock().unwrap_or_else(|poisoned| {
            warn!("Preview store lock was poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }
}

impl PreviewStore for MemoryPreviewStore {
    fn acquire(&self, bytes: Bytes, mime_type: &str) -> PreviewId {
        let id = PreviewId::new();
        self.entries().insert(
            id,
            PreviewImage {
                mime_type: mime_type.to_string(),
                bytes,
            },
        );
        id
    }

    fn get(&self, id: PreviewId) -> Option<PreviewImage> {
        self.entries().get(&id).cloned()
    }

    fn release(&self, id: PreviewId) {
        if self.entries().remove(&id).is_none() {
            warn!(preview = %id, "Released unknown preview");
        }
    }
}

/// Owning handle on a preview. Dropping it releases the preview.
pub struct PreviewLease {
    id: PreviewId,
    store: Arc<dyn PreviewStore>,
}

impl PreviewLease {
    pub fn id(&self) -> PreviewId {
        self.id
    }
}

impl Drop for PreviewLease {
    fn drop(&mut self) {
        debug!(preview = %self.id, "Releasing preview");
        self.store.release(self.id);
    }
}

impl fmt::Debug for PreviewLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewLease").field("id", &self.id).finish()
    }
}

/// A file as the user handed it over, before validation.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// An accepted image together with its live preview.
#[derive(Debug)]
pub struct PendingFile {
    name: String,
    mime_type: String,
    bytes: Bytes,
    preview: PreviewLease,
}

impl PendingFile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Size in megabytes with two decimals, e.g. "1.25 MB".
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size_bytes() as f64 / 1024.0 / 1024.0)
    }

    pub fn preview_id(&self) -> PreviewId {
        self.preview.id()
    }

    pub fn preview_url(&self, prefix: &str) -> String {
        format!("{}/{}", prefix.trim_end_matches('/'), self.preview.id())
    }
}

/// Validates uploads and allocates their previews.
#[derive(Clone)]
pub struct ImageIngestor {
    previews: Arc<dyn PreviewStore>,
    max_bytes: u64,
}

impl ImageIngestor {
    pub fn new(previews: Arc<dyn PreviewStore>) -> Self {
        Self {
            previews,
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn previews(&self) -> &Arc<dyn PreviewStore> {
        &self.previews
    }

    /// Type and size checks, usable before the bytes are in memory.
    pub fn check(&self, mime_type: &str, size_bytes: u64) -> Result<(), ValidationError> {
        if !is_image(mime_type) {
            debug!(mime = %mime_type, "Rejected non-image upload");
            return Err(ValidationError::unsupported_type());
        }
        if size_bytes > self.max_bytes {
            debug!(size = size_bytes, limit = self.max_bytes, "Rejected oversized upload");
            return Err(ValidationError::too_large(self.max_bytes));
        }
        Ok(())
    }

    /// Accept `file` if it is an image within the size limit.
    pub fn submit(&self, file: UploadedFile) -> Result<PendingFile, ValidationError> {
        self.check(&file.mime_type, file.bytes.len() as u64)?;

        let id = self.previews.acquire(file.bytes.clone(), &file.mime_type);
        Ok(PendingFile {
            name: file.name,
            mime_type: file.mime_type,
            bytes: file.bytes,
            preview: PreviewLease {
                id,
                store: Arc::clone(&self.previews),
            },
        })
    }
}

/// Whether a MIME type names an image.
pub fn is_image(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}

/// Whether a preview of this type can be shown inline. Anything else (SVG in
/// particular, which may carry script) is served as a download.
pub fn is_inline_safe(mime: &str) -> bool {
    matches!(
        mime.trim().to_ascii_lowercase().as_str(),
        "image/jpeg" | "image/png" | "image/gif" | "image/webp" | "image/bmp"
    )
}

/// Detect MIME type by file extension.
pub fn detect_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "bmp" => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
