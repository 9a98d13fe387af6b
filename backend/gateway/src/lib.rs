//! textlift HTTP gateway.
//!
//! Serves the browser front end and the session API that drives ingestion,
//! extraction, and result presentation.

pub mod api;
pub mod control_ui;
pub mod error;
pub mod health_api;
pub mod preview;
pub mod server;
pub mod session_registry;
pub mod views;

pub use error::{ApiError, ApiResult};
pub use server::{build_router, start_server, GatewayState};
pub use session_registry::SessionRegistry;
