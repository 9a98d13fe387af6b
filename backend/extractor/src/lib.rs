pub mod client;
pub mod providers;
pub mod session;

pub use client::{ExtractionClient, ExtractionRequest, DEFAULT_MODEL_ID, DEFAULT_TEMPERATURE};
pub use session::{
    Dispatched, FileInfo, NotStarted, Phase, Session, SessionSnapshot, SharedSession, StartOutcome,
};
