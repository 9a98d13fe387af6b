pub mod error;
pub mod ingest;
pub mod mode;
pub mod present;
pub mod result;
pub mod schema;
pub mod traits;

pub use error::{ErrorKind, ExtractError, ValidationError, EMPTY_RESPONSE_MESSAGE};
pub use ingest::{
    detect_mime_type, is_image, is_inline_safe, ImageIngestor, MemoryPreviewStore, PendingFile,
    PreviewId, PreviewImage, PreviewStore, UploadedFile, MAX_UPLOAD_BYTES,
};
pub use mode::{ExtractionMode, ParseModeError};
pub use present::{export_text, raw_json, render, RenderedResult, ResultTab, TableView, ViewBody};
pub use result::{ExtractionResult, FormField, Row, Table};
pub use schema::{spec_for, ModeSpec};
pub use traits::{GenerationConfig, RequestPart, VisionModel, VisionRequest, VisionResponse};
