//! HTTP response handlers.

use std::io;

use tiny_http::{Header, Request, Response, StatusCode};

use super::route::Reply;
use crate::source::ContentStream;
use crate::utils::mime::types::{HTML, PLAIN};

/// Send a routed reply. HEAD requests get headers only (handled by tiny_http).
pub fn respond(request: Request, reply: Reply) -> io::Result<()> {
    match reply {
        Reply::Listing(body) => send_body(request, 200, HTML, body.into_bytes()),
        Reply::Content { mime, stream } => send_stream(request, mime, stream),
        Reply::NotFound(name) => respond_not_found(request, &name),
        Reply::Failed(message) => respond_error(request, &message),
        Reply::MethodNotAllowed => respond_method_not_allowed(request),
    }
}

/// Stream an item with no declared length (chunked for HTTP/1.1 clients).
fn send_stream(request: Request, content_type: &'static str, stream: ContentStream) -> io::Result<()> {
    let response = Response::new(
        StatusCode(200),
        vec![make_header("Content-Type", content_type)],
        stream,
        None,
        None,
    );
    request.respond(response)
}

pub fn respond_not_found(request: Request, name: &str) -> io::Result<()> {
    let body = format!("404 — File not found: {name}");
    send_body(request, 404, PLAIN, body.into_bytes())
}

pub fn respond_error(request: Request, message: &str) -> io::Result<()> {
    let body = format!("Error: {message}");
    send_body(request, 500, PLAIN, body.into_bytes())
}

pub fn respond_method_not_allowed(request: Request) -> io::Result<()> {
    let response = Response::from_data(b"405 Method Not Allowed".to_vec())
        .with_status_code(StatusCode(405))
        .with_header(make_header("Content-Type", PLAIN))
        .with_header(make_header("Allow", "GET, HEAD"));
    request.respond(response)
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> io::Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    request.respond(response)
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}
