//! HTTP response handlers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::utils::mime::{self, types};

/// Respond with a file from the output tree.
pub fn respond_file(request: Request, path: &Path) -> Result<()> {
    let content_type = mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    send_body(request, 200, content_type, body)
}

/// Respond with the site's own `404.html` if it has one, plain text otherwise.
pub fn respond_not_found(request: Request, serve_root: &Path) -> Result<()> {
    let custom_404 = serve_root.join("404.html");
    let has_custom = custom_404.is_file();

    if is_head_request(&request) {
        let content_type = if has_custom { types::HTML } else { types::PLAIN };
        return send_head(request, 404, content_type);
    }

    if has_custom
        && let Ok(body) = fs::read(&custom_404)
    {
        return send_body(request, 404, types::HTML, body);
    }

    send_body(request, 404, types::PLAIN, b"404 Not Found".to_vec())
}

/// 503 while shutting down.
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, types::PLAIN, b"503 Service Unavailable".to_vec())
}

/// 405 for anything but GET / HEAD.
pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    send_body(request, 405, types::PLAIN, b"405 Method Not Allowed".to_vec())
}

pub fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

pub fn is_readable_method(method: &Method) -> bool {
    matches!(method, Method::Get | Method::Head)
}

fn send_head(request: Request, status: u16, content_type: &str) -> Result<()> {
    let mut response = Response::empty(StatusCode(status));
    for header in headers(content_type) {
        response.add_header(header);
    }
    request.respond(response)?;
    Ok(())
}

fn send_body(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    let mut response = Response::from_data(body).with_status_code(StatusCode(status));
    for header in headers(content_type) {
        response.add_header(header);
    }
    request.respond(response)?;
    Ok(())
}

/// Every rebuild replaces the output, so nothing may be cached.
fn headers(content_type: &str) -> Vec<Header> {
    [("Content-Type", content_type), ("Cache-Control", "no-cache")]
        .into_iter()
        .filter_map(|(key, value)| Header::from_bytes(key, value).ok())
        .collect()
}
