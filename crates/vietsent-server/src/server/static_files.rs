use axum::{
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use rust_embed::Embed;

#[derive(Embed)]
#[folder = "web/dist"]
struct WebAssets;

/// Serve the embedded web UI
pub async fn serve_static(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    if let Some(content) = <WebAssets as Embed>::get(path) {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        return (
            StatusCode::OK,
            [(header::CONTENT_TYPE, mime.as_ref())],
            content.data.into_owned(),
        )
            .into_response();
    }

    // Unknown paths get the single page
    if let Some(content) = <WebAssets as Embed>::get("index.html") {
        return Html(String::from_utf8_lossy(&content.data).to_string()).into_response();
    }

    Html(FALLBACK_HTML.to_string()).into_response()
}

const FALLBACK_HTML: &str = r#"<!DOCTYPE html>
<html lang="vi">
<head>
    <meta charset="UTF-8">
    <title>Phân tích cảm xúc</title>
</head>
<body>
    <h1>Phân tích cảm xúc tiếng Việt</h1>
    <p>Giao diện web chưa được đóng gói. API vẫn hoạt động tại <code>/api/sentiment</code> và <code>/api/history</code>.</p>
</body>
</html>
"#;
