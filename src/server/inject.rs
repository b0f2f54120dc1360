// src/server/inject.rs

use axum::body::{to_bytes, Body};
use axum::extract::Request;
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::server::livereload::CLIENT_SCRIPT_PATH;

/// Largest HTML body the injector buffers.
const MAX_HTML_BYTES: usize = 16 * 1024 * 1024;

/// Insert the live-reload `<script>` into `html`, before the last `</body>`
/// or at the end when there is none.
pub fn inject_script(html: &str) -> String {
    let tag = format!("<script src=\"{CLIENT_SCRIPT_PATH}\"></script>");
    let lower = html.to_ascii_lowercase();
    match lower.rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + tag.len());
            out.push_str(&html[..idx]);
            out.push_str(&tag);
            out.push_str(&html[idx..]);
            out
        }
        None => format!("{html}{tag}"),
    }
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"))
}

/// Middleware: rewrite HTML responses to load the live-reload client.
pub async fn inject_reload_script(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if !is_html(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_HTML_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "cannot buffer HTML response for live reload");
            return Response::from_parts(parts, Body::empty());
        }
    };

    let html = String::from_utf8_lossy(&bytes);
    let injected = inject_script(&html);
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(injected))
}
