//! Session API handlers.

use std::path::Path as FsPath;
use std::time::Instant;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use textlift_core::{
    detect_mime_type, export_text, raw_json, render, ExtractionMode, ExtractionResult, ResultTab,
    UploadedFile, ValidationError,
};
use textlift_extractor::{SessionSnapshot, StartOutcome};
use textlift_logging::{ExtractionEvent, ExtractionEventLogger};

use crate::error::{ApiError, ApiResult};
use crate::server::GatewayState;
use crate::views;

/// A session snapshot plus the URLs the browser needs.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub preview_url: Option<String>,
    #[serde(flatten)]
    pub session: SessionSnapshot,
}

impl SessionResponse {
    fn new(id: &str, session: SessionSnapshot) -> Self {
        // The preview id in the query string changes with every file, so
        // browsers never show a stale image.
        let preview_url = session
            .file
            .as_ref()
            .map(|f| format!("/api/sessions/{id}/preview?v={}", f.preview_id));
        Self {
            id: id.to_string(),
            preview_url,
            session,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SettingsUpdate {
    pub mode: Option<ExtractionMode>,
    pub summarize: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
    #[default]
    Json,
    Html,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResultQuery {
    pub tab: Option<String>,
    pub format: Option<ResultFormat>,
}

fn parse_tab(tab: Option<&str>) -> ApiResult<ResultTab> {
    match tab {
        Some(tab) => tab.parse().map_err(ApiError::BadRequest),
        None => Ok(ResultTab::default()),
    }
}

/// POST /api/sessions
pub async fn create_session(
    State(state): State<GatewayState>,
) -> (StatusCode, Json<SessionResponse>) {
    let (id, session) = state.sessions.create().await;
    let snapshot = session.snapshot().await;
    (StatusCode::CREATED, Json(SessionResponse::new(&id, snapshot)))
}

/// GET /api/sessions/:id
pub async fn get_session(
    Path(id): Path<String>,
    State(state): State<GatewayState>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.session(&id).await?;
    let snapshot = session.snapshot().await;
    Ok(Json(SessionResponse::new(&id, snapshot)))
}

/// DELETE /api/sessions/:id
pub async fn delete_session(
    Path(id): Path<String>,
    State(state): State<GatewayState>,
) -> ApiResult<StatusCode> {
    if state.sessions.remove(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

async fn read_upload(multipart: &mut Multipart, max_bytes: u64) -> ApiResult<UploadedFile> {
    let reject = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::Rejected(ValidationError::too_large(max_bytes))
        } else {
            ApiError::BadRequest(e.body_text())
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(reject)? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload").to_string();
        let mime_type = match field.content_type() {
            Some(ct) if ct != "application/octet-stream" => ct.to_string(),
            _ => detect_mime_type(FsPath::new(&name)).to_string(),
        };
        let bytes = field.bytes().await.map_err(reject)?;
        return Ok(UploadedFile::new(name, mime_type, bytes));
    }
    Err(ApiError::BadRequest(
        "multipart field 'file' is missing".to_string(),
    ))
}

/// PUT /api/sessions/:id/file
///
/// A rejected upload leaves the current file untouched.
pub async fn upload_file(
    Path(id): Path<String>,
    State(state): State<GatewayState>,
    mut multipart: Multipart,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.session(&id).await?;
    let upload = read_upload(&mut multipart, state.ingestor.max_bytes()).await?;

    let pending = match state.ingestor.submit(upload) {
        Ok(pending) => pending,
        Err(rejection) => {
            ExtractionEventLogger::log(
                &id,
                ExtractionEvent::Rejected {
                    reason: rejection.message.clone(),
                },
            );
            return Err(rejection.into());
        }
    };
    info!(session_id = %id, name = %pending.name(), size = %pending.size_label(), "File selected");

    let mut guard = session.lock().await;
    guard.select_file(pending);
    Ok(Json(SessionResponse::new(&id, guard.snapshot())))
}

/// DELETE /api/sessions/:id/file
pub async fn clear_file(
    Path(id): Path<String>,
    State(state): State<GatewayState>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.session(&id).await?;
    let mut guard = session.lock().await;
    guard.clear_file();
    Ok(Json(SessionResponse::new(&id, guard.snapshot())))
}

/// PUT /api/sessions/:id/settings
pub async fn update_settings(
    Path(id): Path<String>,
    State(state): State<GatewayState>,
    Json(update): Json<SettingsUpdate>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.session(&id).await?;
    let mut guard = session.lock().await;
    if let Some(mode) = update.mode {
        guard.set_mode(mode);
    }
    if let Some(summarize) = update.summarize {
        guard.set_summarize(summarize);
    }
    Ok(Json(SessionResponse::new(&id, guard.snapshot())))
}

fn outcome_of(result: &ExtractionResult) -> &'static str {
    result.mode().map(|m| m.as_str()).unwrap_or("error")
}

/// POST /api/sessions/:id/extract
///
/// Returns 202 once the call is dispatched. Poll the session for `settled`.
pub async fn start_extraction(
    Path(id): Path<String>,
    State(state): State<GatewayState>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let session = state.session(&id).await?;
    let started_at = Instant::now();

    let dispatched = match session.start_extraction(&state.client).await {
        StartOutcome::Started(dispatched) => dispatched,
        StartOutcome::NotStarted(reason) => {
            let err = ApiError::NotStarted(reason);
            ExtractionEventLogger::log(
                &id,
                ExtractionEvent::Rejected {
                    reason: err.to_string(),
                },
            );
            return Err(err);
        }
    };

    let mode = dispatched.mode;
    ExtractionEventLogger::log(
        &id,
        ExtractionEvent::Started {
            mode: mode.to_string(),
            summarize: dispatched.summarize,
            mime_type: dispatched.mime_type,
            size_bytes: dispatched.size_bytes,
        },
    );
    let handle = dispatched.handle;

    let session_id = id.clone();
    tokio::spawn(async move {
        let (outcome, detail) = match handle.await {
            Ok(result) => (
                outcome_of(&result),
                result.error_message().map(str::to_string),
            ),
            Err(e) => {
                error!(session_id = %session_id, error = %e, "Extraction task join failed");
                ("error", Some(e.to_string()))
            }
        };
        ExtractionEventLogger::log(
            &session_id,
            ExtractionEvent::Settled {
                mode: mode.to_string(),
                outcome: outcome.to_string(),
                latency_ms: started_at.elapsed().as_millis() as u64,
                detail,
            },
        );
    });

    let snapshot = session.snapshot().await;
    Ok((StatusCode::ACCEPTED, Json(SessionResponse::new(&id, snapshot))))
}

/// GET /api/sessions/:id/result?tab=visual|json&format=json|html
///
/// The visual tab is rendered against the session's current mode.
pub async fn get_result(
    Path(id): Path<String>,
    State(state): State<GatewayState>,
    Query(query): Query<ResultQuery>,
) -> ApiResult<Response> {
    let tab = parse_tab(query.tab.as_deref())?;
    let format = query.format.unwrap_or_default();

    let session = state.session(&id).await?;
    let guard = session.lock().await;
    let result = guard.last_result().ok_or(ApiError::NoResult)?;
    let mode = guard.mode();

    let response = match (tab, format) {
        (ResultTab::Visual, ResultFormat::Json) => Json(render(result, mode)).into_response(),
        (ResultTab::Json, ResultFormat::Json) => Json(result).into_response(),
        (ResultTab::Visual, ResultFormat::Html) => {
            Html(views::render_visual(&render(result, mode))).into_response()
        }
        (ResultTab::Json, ResultFormat::Html) => {
            Html(views::render_json(result.summary(), &raw_json(result))).into_response()
        }
    };
    Ok(response)
}

/// GET /api/sessions/:id/export?tab=visual|json
pub async fn export_result(
    Path(id): Path<String>,
    State(state): State<GatewayState>,
    Query(query): Query<ResultQuery>,
) -> ApiResult<Response> {
    let tab = parse_tab(query.tab.as_deref())?;
    let session = state.session(&id).await?;
    let guard = session.lock().await;
    let result = guard.last_result().ok_or(ApiError::NoResult)?;
    let text = export_text(result, guard.mode(), tab);
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        text,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body, Bytes},
        http::Request,
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use textlift_core::{ImageIngestor, MemoryPreviewStore};
    use textlift_extractor::providers::MockProvider;
    use textlift_extractor::ExtractionClient;

    use super::*;
    use crate::server::build_router;

    const BOUNDARY: &str = "textlift-test-boundary";

    fn app_with(provider: MockProvider, max_bytes: u64) -> (Router, Arc<MemoryPreviewStore>) {
        let store = Arc::new(MemoryPreviewStore::new());
        let ingestor = ImageIngestor::new(store.clone()).with_max_bytes(max_bytes);
        let client = ExtractionClient::new(Arc::new(provider));
        (build_router(GatewayState::new(ingestor, client)), store)
    }

    fn app(provider: MockProvider) -> (Router, Arc<MemoryPreviewStore>) {
        app_with(provider, textlift_core::MAX_UPLOAD_BYTES)
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Bytes) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, body)
    }

    async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = send(app, req).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn upload(id: &str, filename: &str, mime: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("PUT")
            .uri(format!("/api/sessions/{id}/file"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn new_session(app: &Router) -> String {
        let (status, body) = send_json(app, request("POST", "/api/sessions")).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    async fn wait_settled(app: &Router, id: &str) -> Value {
        for _ in 0..200 {
            let (_, body) = send_json(app, request("GET", &format!("/api/sessions/{id}"))).await;
            if body["phase"] == "settled" {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("session {id} never settled");
    }

    #[tokio::test]
    async fn new_session_is_idle() {
        let (app, _) = app(MockProvider::new("mock"));
        let id = new_session(&app).await;
        let (status, body) = send_json(&app, request("GET", &format!("/api/sessions/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "idle");
        assert_eq!(body["mode"], "text");
        assert_eq!(body["summarize"], false);
        assert!(body["file"].is_null());
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let (app, _) = app(MockProvider::new("mock"));
        let (status, body) = send_json(&app, request("GET", "/api/sessions/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["type"], "session_not_found");
    }

    #[tokio::test]
    async fn non_image_upload_is_rejected() {
        let (app, store) = app(MockProvider::new("mock"));
        let id = new_session(&app).await;

        let (status, body) =
            send_json(&app, upload(&id, "doc.pdf", "application/pdf", b"%PDF")).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(
            body["error"]["message"],
            "Please upload an image file (JPG, PNG, WEBP)."
        );
        assert_eq!(store.live_count(), 0);

        let (_, session) = send_json(&app, request("GET", &format!("/api/sessions/{id}"))).await;
        assert!(session["file"].is_null());
    }

    #[tokio::test]
    async fn oversize_upload_keeps_previous_file() {
        let (app, store) = app_with(MockProvider::new("mock"), 1024 * 1024);
        let id = new_session(&app).await;

        let (status, _) = send(&app, upload(&id, "a.png", "image/png", &[7u8; 16])).await;
        assert_eq!(status, StatusCode::OK);

        let big = vec![0u8; 1024 * 1024 + 1];
        let (status, body) = send_json(&app, upload(&id, "big.png", "image/png", &big)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            body["error"]["message"],
            "File size too large. Maximum size is 1MB."
        );

        let (_, session) = send_json(&app, request("GET", &format!("/api/sessions/{id}"))).await;
        assert_eq!(session["file"]["name"], "a.png");
        assert_eq!(store.live_count(), 1);
    }

    #[tokio::test]
    async fn extraction_flow_renders_tables() {
        let (app, _) = app(MockProvider::new("mock").with_response(
            r#"{"tables": [[["Item","Qty"],["Apple","3"]]], "summary": "Fruit order"}"#,
        ));
        let id = new_session(&app).await;

        let (status, _) = send(&app, upload(&id, "t.png", "image/png", b"png-bytes")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send_json(
            &app,
            json_request(
                "PUT",
                &format!("/api/sessions/{id}/settings"),
                serde_json::json!({"mode": "tables", "summarize": true}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "tables");
        assert_eq!(body["summarize"], true);

        let (status, _) = send(&app, request("POST", &format!("/api/sessions/{id}/extract"))).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let settled = wait_settled(&app, &id).await;
        assert_eq!(settled["is_processing"], false);
        assert_eq!(settled["last_result"]["summary"], "Fruit order");

        let (status, view) =
            send_json(&app, request("GET", &format!("/api/sessions/{id}/result"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["summary"], "Fruit order");
        assert_eq!(view["body"]["kind"], "tables");
        assert_eq!(view["body"]["content"][0]["header"][0], "Item");

        let (_, html) = send(
            &app,
            request("GET", &format!("/api/sessions/{id}/result?format=html")),
        )
        .await;
        let html = String::from_utf8(html.to_vec()).unwrap();
        assert!(html.contains("<th>Item</th>"));
        assert!(html.contains("<td>Apple</td>"));
        assert!(html.contains("Fruit order"));
    }

    #[tokio::test]
    async fn extract_without_file_conflicts() {
        let (app, _) = app(MockProvider::new("mock"));
        let id = new_session(&app).await;

        let (status, body) =
            send_json(&app, request("POST", &format!("/api/sessions/{id}/extract"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["type"], "no_file");

        let (_, session) = send_json(&app, request("GET", &format!("/api/sessions/{id}"))).await;
        assert_eq!(session["phase"], "idle");
    }

    #[tokio::test]
    async fn second_extract_while_in_flight_conflicts() {
        let provider = MockProvider::new("mock").with_delay(Duration::from_millis(100));
        let (app, _) = app(provider);
        let id = new_session(&app).await;
        send(&app, upload(&id, "a.png", "image/png", b"x")).await;

        let (first, _) = send(&app, request("POST", &format!("/api/sessions/{id}/extract"))).await;
        assert_eq!(first, StatusCode::ACCEPTED);
        let (second, body) =
            send_json(&app, request("POST", &format!("/api/sessions/{id}/extract"))).await;
        assert_eq!(second, StatusCode::CONFLICT);
        assert_eq!(body["error"]["type"], "in_flight");

        let (_, session) = send_json(&app, request("GET", &format!("/api/sessions/{id}"))).await;
        assert_eq!(session["phase"], "in_flight");
        assert!(session["last_result"].is_null());

        wait_settled(&app, &id).await;
    }

    #[tokio::test]
    async fn failed_call_settles_with_error_view() {
        let (app, _) = app(MockProvider::new("mock").with_failure("connection refused"));
        let id = new_session(&app).await;
        send(&app, upload(&id, "a.png", "image/png", b"x")).await;
        send(&app, request("POST", &format!("/api/sessions/{id}/extract"))).await;

        let settled = wait_settled(&app, &id).await;
        assert!(settled["last_result"]["error"].is_string());

        let (_, view) =
            send_json(&app, request("GET", &format!("/api/sessions/{id}/result"))).await;
        assert_eq!(view["body"]["kind"], "error");
        assert!(view["summary"].is_null());
    }

    #[tokio::test]
    async fn export_follows_tab() {
        let (app, _) =
            app(MockProvider::new("mock").with_response(r#"{"rawText": "Hello\nWorld"}"#));
        let id = new_session(&app).await;
        send(&app, upload(&id, "a.png", "image/png", b"x")).await;
        send(&app, request("POST", &format!("/api/sessions/{id}/extract"))).await;
        wait_settled(&app, &id).await;

        let (status, text) =
            send(&app, request("GET", &format!("/api/sessions/{id}/export"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&text[..], b"Hello\nWorld");

        let (_, json) = send(
            &app,
            request("GET", &format!("/api/sessions/{id}/export?tab=json")),
        )
        .await;
        let parsed: Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed["rawText"], "Hello\nWorld");

        let (status, _) = send(
            &app,
            request("GET", &format!("/api/sessions/{id}/export?tab=bogus")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn result_before_extraction_is_not_found() {
        let (app, _) = app(MockProvider::new("mock"));
        let id = new_session(&app).await;
        let (status, body) =
            send_json(&app, request("GET", &format!("/api/sessions/{id}/result"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["type"], "no_result");
    }

    #[tokio::test]
    async fn preview_served_then_released() {
        let (app, store) = app(MockProvider::new("mock"));
        let id = new_session(&app).await;
        let (_, session) = send_json(&app, upload(&id, "a.png", "image/png", b"\x89PNG")).await;
        assert!(session["preview_url"]
            .as_str()
            .unwrap()
            .starts_with(&format!("/api/sessions/{id}/preview")));

        let resp = app
            .clone()
            .oneshot(request("GET", &format!("/api/sessions/{id}/preview")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(resp.headers()[header::CONTENT_DISPOSITION], "inline");
        assert_eq!(resp.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"\x89PNG");

        let (status, _) = send(&app, request("DELETE", &format!("/api/sessions/{id}/file"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(store.live_count(), 0);

        let (status, _) =
            send(&app, request("GET", &format!("/api/sessions/{id}/preview"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn svg_preview_is_served_as_download() {
        let (app, _) = app(MockProvider::new("mock"));
        let id = new_session(&app).await;
        let svg = b"<svg><script>alert(document.domain)</script></svg>";
        let (status, _) = send(&app, upload(&id, "x.svg", "image/svg+xml", svg)).await;
        assert_eq!(status, StatusCode::OK);

        let resp = app
            .clone()
            .oneshot(request("GET", &format!("/api/sessions/{id}/preview")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_DISPOSITION], "attachment");
        assert_eq!(resp.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    }

    #[tokio::test]
    async fn replacing_file_keeps_one_preview() {
        let (app, store) = app(MockProvider::new("mock"));
        let id = new_session(&app).await;
        send(&app, upload(&id, "a.png", "image/png", b"a")).await;
        send(&app, upload(&id, "b.webp", "image/webp", b"b")).await;
        assert_eq!(store.live_count(), 1);
    }

    #[tokio::test]
    async fn deleting_session_releases_preview() {
        let (app, store) = app(MockProvider::new("mock"));
        let id = new_session(&app).await;
        send(&app, upload(&id, "a.png", "image/png", b"a")).await;
        assert_eq!(store.live_count(), 1);

        let (status, _) = send(&app, request("DELETE", &format!("/api/sessions/{id}"))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(store.live_count(), 0);

        let (status, _) = send(&app, request("GET", &format!("/api/sessions/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_and_index() {
        let (app, _) = app(MockProvider::new("mock"));
        let (status, body) = send_json(&app, request("GET", "/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["provider"], "mock");

        let (status, page) = send(&app, request("GET", "/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8_lossy(&page).contains("Start Extraction"));
    }
}
