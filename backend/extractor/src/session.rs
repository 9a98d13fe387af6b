//! Session state and extraction orchestration.
//!
//! A session moves between `Idle`, `InFlight`, and `Settled`. At most one
//! extraction is in flight; a second start while one is running does
//! nothing. There is no cancellation: a call that was dispatched always
//! lands in `last_result`, even if the user changed mode or file meanwhile.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use textlift_core::{ExtractionMode, ExtractionResult, PendingFile};

use crate::client::{ExtractionClient, ExtractionRequest};

/// Shown when the extraction task itself died instead of returning a result.
pub const TASK_FAILURE_MESSAGE: &str = "Failed to process document. See console for details.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    InFlight,
    Settled,
}

/// Why `begin_extraction` did not start a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotStarted {
    NoFile,
    AlreadyInFlight,
}

/// State of one user session.
#[derive(Debug, Default)]
pub struct Session {
    current_file: Option<PendingFile>,
    mode: ExtractionMode,
    summarize: bool,
    is_processing: bool,
    last_result: Option<ExtractionResult>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_file(&self) -> Option<&PendingFile> {
        self.current_file.as_ref()
    }

    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    pub fn summarize(&self) -> bool {
        self.summarize
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    pub fn last_result(&self) -> Option<&ExtractionResult> {
        self.last_result.as_ref()
    }

    pub fn phase(&self) -> Phase {
        if self.is_processing {
            Phase::InFlight
        } else if self.last_result.is_some() {
            Phase::Settled
        } else {
            Phase::Idle
        }
    }

    /// Adopt `file`, releasing the previous file's preview first.
    pub fn select_file(&mut self, file: PendingFile) {
        drop(self.current_file.take());
        self.current_file = Some(file);
        self.last_result = None;
    }

    /// Release the current file, if any. Safe to call repeatedly.
    pub fn clear_file(&mut self) {
        if let Some(file) = self.current_file.take() {
            debug!(name = %file.name(), "Clearing file");
        }
        self.last_result = None;
    }

    pub fn set_mode(&mut self, mode: ExtractionMode) {
        self.mode = mode;
    }

    pub fn set_summarize(&mut self, summarize: bool) {
        self.summarize = summarize;
    }

    pub fn toggle_summarize(&mut self) -> bool {
        self.summarize = !self.summarize;
        self.summarize
    }

    /// Enter `InFlight` and snapshot the request, unless there is no file
    /// or a call is already running. A refused start changes nothing.
    pub fn begin_extraction(&mut self) -> Result<ExtractionRequest, NotStarted> {
        if self.is_processing {
            return Err(NotStarted::AlreadyInFlight);
        }
        let file = self.current_file.as_ref().ok_or(NotStarted::NoFile)?;
        let request = ExtractionRequest::from_file(file, self.mode, self.summarize);
        self.is_processing = true;
        self.last_result = None;
        Ok(request)
    }

    /// Record the outcome of the in-flight call.
    pub fn settle(&mut self, result: ExtractionResult) {
        self.last_result = Some(result);
        self.is_processing = false;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            file: self.current_file.as_ref().map(FileInfo::from),
            mode: self.mode,
            summarize: self.summarize,
            phase: self.phase(),
            is_processing: self.is_processing,
            last_result: self.last_result.clone(),
        }
    }
}

/// Displayable facts about the current file.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub size_label: String,
    pub preview_id: String,
}

impl From<&PendingFile> for FileInfo {
    fn from(file: &PendingFile) -> Self {
        Self {
            name: file.name().to_string(),
            mime_type: file.mime_type().to_string(),
            size_bytes: file.size_bytes(),
            size_label: file.size_label(),
            preview_id: file.preview_id().to_string(),
        }
    }
}

/// Serializable view of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub file: Option<FileInfo>,
    pub mode: ExtractionMode,
    pub summarize: bool,
    pub phase: Phase,
    pub is_processing: bool,
    pub last_result: Option<ExtractionResult>,
}

/// What `SharedSession::start_extraction` did.
#[derive(Debug)]
pub enum StartOutcome {
    Started(Dispatched),
    NotStarted(NotStarted),
}

/// A dispatched call: the settings it was sent with and a handle that
/// resolves to the settled result.
#[derive(Debug)]
pub struct Dispatched {
    pub mode: ExtractionMode,
    pub summarize: bool,
    pub mime_type: String,
    pub size_bytes: u64,
    pub handle: JoinHandle<ExtractionResult>,
}

/// A session shared between request handlers and the extraction task.
#[derive(Clone, Default)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().await
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().await.snapshot()
    }

    /// Dispatch one extraction in the background.
    ///
    /// The session lock is released while the model call runs.
    pub async fn start_extraction(&self, client: &ExtractionClient) -> StartOutcome {
        let request = match self.inner.lock().await.begin_extraction() {
            Ok(request) => request,
            Err(reason) => {
                debug!(?reason, "Extraction not started");
                return StartOutcome::NotStarted(reason);
            }
        };

        let mode = request.mode;
        let summarize = request.summarize;
        let mime_type = request.mime_type.clone();
        let size_bytes = request.image.len() as u64;

        let session = self.clone();
        let client = client.clone();
        let handle = tokio::spawn(async move {
            let call = tokio::spawn(async move { client.extract(&request).await });
            let result = match call.await {
                Ok(result) => result,
                Err(e) => {
                    error!(error = %e, "Extraction task failed");
                    ExtractionResult::error(TASK_FAILURE_MESSAGE)
                }
            };
            session.inner.lock().await.settle(result.clone());
            result
        });

        StartOutcome::Started(Dispatched {
            mode,
            summarize,
            mime_type,
            size_bytes,
            handle,
        })
    }

    /// Start an extraction and wait for it to settle.
    pub async fn run_extraction(
        &self,
        client: &ExtractionClient,
    ) -> Result<ExtractionResult, NotStarted> {
        match self.start_extraction(client).await {
            StartOutcome::Started(dispatched) => Ok(dispatched
                .handle
                .await
                .unwrap_or_else(|_| ExtractionResult::error(TASK_FAILURE_MESSAGE))),
            StartOutcome::NotStarted(reason) => Err(reason),
        }
    }
}
