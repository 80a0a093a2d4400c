//! Client dev server with hot reload via Server-Sent Events.
//!
//! Serves the latest good client build from the in-memory cache (falling back
//! to disk for nested files) and pushes a reload event to connected browsers
//! after every successful client compile.

use crate::dev::config::ServiceAddr;
use crate::dev::state::{content_type_for, HmrEvent, SharedState};
use crate::error::{CliError, Result};
use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Response, Sse,
    },
    routing::get,
    Router,
};
use std::convert::Infallible;
use std::path::{Component, Path};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_stream::{wrappers::ReceiverStream, Stream, StreamExt};
use tower_http::cors::{Any, CorsLayer};

/// SSE endpoint browsers subscribe to.
pub const HMR_ENDPOINT: &str = "/__tandem_hmr__";

/// Reload client script.
pub const HMR_SCRIPT: &str = "/__tandem_hmr__.js";

const HMR_CLIENT_JS: &str = include_str!("../../assets/dev/hmr-client.js");

/// Bind the client dev server's listener.
///
/// # Errors
///
/// Returns error if the address can't be bound
pub async fn bind(addr: &ServiceAddr) -> Result<TcpListener> {
    TcpListener::bind((addr.hostname.as_str(), addr.port))
        .await
        .map_err(|e| CliError::Server(format!("Failed to bind to {}: {}", addr.origin, e)))
}

/// Serve the client build on `listener` until the server stops.
///
/// # Errors
///
/// Returns error if the serve loop fails
pub async fn serve(listener: TcpListener, state: SharedState) -> Result<()> {
    axum::serve(listener, router(state))
        .await
        .map_err(|e| CliError::Server(format!("Server error: {}", e)))
}

/// Build the router with all routes.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route(HMR_ENDPOINT, get(handle_sse))
        .route(HMR_SCRIPT, get(handle_hmr_script))
        .fallback(handle_request)
        .layer(
            // The supervised server's pages load these assets cross-origin
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Handle SSE connections for reload events.
async fn handle_sse(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (id, rx) = state.register_client();
    tracing::debug!(client = id, "hot reload client connected");

    let hello = serde_json::to_string(&HmrEvent::Connected { id })
        .unwrap_or_else(|_| "{}".to_string());

    let stream = tokio_stream::once(hello)
        .chain(ReceiverStream::new(rx))
        .map(|data| Ok(Event::default().data(data)));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// Serve the reload client script.
async fn handle_hmr_script() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/javascript"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        HMR_CLIENT_JS,
    )
}

/// Serve build files, the index page, or a placeholder before the first build.
async fn handle_request(State(state): State<SharedState>, uri: Uri) -> Response {
    let path = uri.path();

    if !state.has_build() {
        return waiting_page();
    }

    let index_path = state.url_for("index.html");
    let is_index = path == "/" || path == state.public_path();

    if is_index {
        return match state.get_cached_file(&index_path) {
            Some((content, content_type)) => {
                file_response(inject_hmr_script(&content, &content_type), &content_type)
            }
            None => not_found(path),
        };
    }

    if let Some((content, content_type)) = state.get_cached_file(path) {
        let content = inject_hmr_script(&content, &content_type);
        return file_response(content, &content_type);
    }

    let Some(relative) = path.strip_prefix(state.public_path()) else {
        return not_found(path);
    };
    if !is_safe_relative(relative) {
        return (StatusCode::FORBIDDEN, "Forbidden").into_response();
    }

    let file_path = state.out_dir().join(relative);
    if file_path.is_file() {
        match tokio::fs::read(&file_path).await {
            Ok(content) => return file_response(content, content_type_for(relative)),
            Err(e) => {
                tracing::warn!(path = %file_path.display(), error = %e, "failed to read build file");
            }
        }
    }

    not_found(path)
}

fn file_response(content: Vec<u8>, content_type: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        content,
    )
        .into_response()
}

fn not_found(path: &str) -> Response {
    (StatusCode::NOT_FOUND, format!("File not found: {}", path)).into_response()
}

/// Placeholder served until the first good client build lands.
///
/// Carries the reload script so the page refreshes itself once it does.
fn waiting_page() -> Response {
    let html = format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Building...</title></head>\n\
         <body>\n  <p>Waiting for the first client build...</p>\n  <script src=\"{}\"></script>\n</body>\n</html>\n",
        HMR_SCRIPT
    );

    (
        StatusCode::SERVICE_UNAVAILABLE,
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        html,
    )
        .into_response()
}

/// A request path is only mapped onto disk when it can't climb out of the
/// output directory.
fn is_safe_relative(relative: &str) -> bool {
    Path::new(relative)
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
}

/// Inject the reload script into HTML content.
///
/// Adds the script before the closing </body> tag, or appends it.
fn inject_hmr_script(content: &[u8], content_type: &str) -> Vec<u8> {
    if !content_type.starts_with("text/html") {
        return content.to_vec();
    }

    let html = String::from_utf8_lossy(content);
    let script_tag = format!(r#"<script src="{}"></script>"#, HMR_SCRIPT);

    if let Some(pos) = html.rfind("</body>") {
        let mut result = String::with_capacity(html.len() + script_tag.len() + 4);
        result.push_str(&html[..pos]);
        result.push_str("  ");
        result.push_str(&script_tag);
        result.push('\n');
        result.push_str(&html[pos..]);
        return result.into_bytes();
    }

    let mut result = html.into_owned();
    result.push('\n');
    result.push_str(&script_tag);
    result.into_bytes()
}
