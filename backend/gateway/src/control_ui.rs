//! The browser front end: a single static page driving the session API.

use axum::response::Html;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
