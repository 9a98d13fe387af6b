//! `textlift extract`: one-shot extraction of an image on disk.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use textlift_core::{
    detect_mime_type, raw_json, render, ExtractionMode, ExtractionResult, ImageIngestor,
    UploadedFile, ValidationError,
};
use textlift_extractor::{ExtractionClient, SharedSession};

use crate::terminal_output::{note_error, render_result, supports_color};

/// Ingest `path` and run one extraction through a fresh session.
///
/// The outer error is for I/O and wiring problems; the inner one is the
/// ingestor refusing the file.
pub async fn extract_file(
    ingestor: &ImageIngestor,
    client: &ExtractionClient,
    path: &Path,
    mode: ExtractionMode,
    summarize: bool,
) -> Result<Result<ExtractionResult, ValidationError>> {
    let mime_type = detect_mime_type(path);
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Failed to stat image: {}", path.display()))?;
    if let Err(rejection) = ingestor.check(mime_type, metadata.len()) {
        return Ok(Err(rejection));
    }

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image: {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let upload = UploadedFile::new(name, mime_type, bytes);
    debug!(name = %upload.name, mime = %upload.mime_type, "Read image from disk");

    let pending = match ingestor.submit(upload) {
        Ok(pending) => pending,
        Err(rejection) => return Ok(Err(rejection)),
    };

    let session = SharedSession::new();
    {
        let mut guard = session.lock().await;
        guard.select_file(pending);
        guard.set_mode(mode);
        guard.set_summarize(summarize);
    }

    let result = session
        .run_extraction(client)
        .await
        .map_err(|reason| anyhow!("extraction did not start: {reason:?}"))?;
    Ok(Ok(result))
}

/// Run the command and print the result. Returns whether it succeeded.
pub async fn run(
    ingestor: &ImageIngestor,
    client: &ExtractionClient,
    path: &Path,
    mode: ExtractionMode,
    summarize: bool,
    json: bool,
) -> Result<bool> {
    let result = match extract_file(ingestor, client, path, mode, summarize).await? {
        Ok(result) => result,
        Err(rejection) => {
            note_error(&rejection.message);
            return Ok(false);
        }
    };

    if json {
        println!("{}", raw_json(&result));
    } else {
        print!("{}", render_result(&render(&result, mode), supports_color()));
    }
    Ok(!result.is_error())
}
