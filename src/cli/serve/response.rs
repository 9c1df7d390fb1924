//! HTTP response handlers.

use crate::utils::mime::types::{HTML, PLAIN};
use anyhow::{Context, Result};
use std::{fs, path::Path};
use tiny_http::{Header, Method, Request, Response, StatusCode};

/// Policy sent with every HTML page: scripts from this origin (and inline
/// bootstrap code) only.
pub const CONTENT_SECURITY_POLICY: &str = "script-src 'self' 'unsafe-inline'; default-src 'self'";

/// Respond with a static file.
pub fn respond_file(request: Request, path: &Path) -> Result<()> {
    let content_type = crate::utils::mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    send_body(request, 200, content_type, body)
}

/// Respond with 404.
pub fn respond_not_found(request: Request) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 404, PLAIN);
    }
    send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 405 for anything but GET and HEAD.
pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    let response = Response::from_data(b"405 Method Not Allowed".to_vec())
        .with_status_code(StatusCode(405))
        .with_header(make_header("Content-Type", PLAIN))
        .with_header(make_header("Allow", "GET, HEAD"));
    request.respond(response)?;
    Ok(())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

pub fn is_allowed_method(request: &Request) -> bool {
    matches!(request.method(), Method::Get | Method::Head)
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response = Response::empty(StatusCode(status));
    request.respond(with_common_headers(response, content_type))?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = Response::from_data(body).with_status_code(StatusCode(status));
    request.respond(with_common_headers(response, content_type))?;
    Ok(())
}

/// Content type and no-cache on everything (the artifact changes under the
/// same URL on every build); CSP on HTML.
fn with_common_headers<R: std::io::Read>(
    response: Response<R>,
    content_type: &'static str,
) -> Response<R> {
    let response = response
        .with_header(make_header("Content-Type", content_type))
        .with_header(make_header("Cache-Control", "no-cache"));

    if content_type == HTML {
        response.with_header(make_header(
            "Content-Security-Policy",
            CONTENT_SECURITY_POLICY,
        ))
    } else {
        response
    }
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    // Both halves are static ASCII
    Header::from_bytes(key, value).unwrap_or_else(|()| unreachable!("invalid header {key}"))
}
