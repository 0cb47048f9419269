//! HTTP response handlers.

use anyhow::Result;
use tiny_http::{Header, Method, Request, Response, StatusCode};

const PLAIN: &str = "text/plain; charset=utf-8";

/// Header carrying the application generation that produced a response.
pub const GENERATION_HEADER: &str = "X-Warmswap-Generation";

/// Respond with a route body.
pub fn respond_route(request: Request, body: &str, generation: usize) -> Result<()> {
    let generation = generation.to_string();
    if is_head_request(&request) {
        let response = Response::empty(StatusCode(200))
            .with_header(make_header("Content-Type", PLAIN))
            .with_header(make_header(GENERATION_HEADER, &generation));
        return request.respond(response).map_err(Into::into);
    }

    let response = Response::from_data(body.as_bytes().to_vec())
        .with_status_code(StatusCode(200))
        .with_header(make_header("Content-Type", PLAIN))
        .with_header(make_header(GENERATION_HEADER, &generation));
    request.respond(response)?;
    Ok(())
}

/// Respond with 404 Not Found.
pub fn respond_not_found(request: Request) -> Result<()> {
    send_body(request, 404, b"404 Not Found")
}

/// Respond with 405 for anything but GET/HEAD.
pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    send_body(request, 405, b"405 Method Not Allowed")
}

/// Respond with 503 Service Unavailable (application stopped or shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, b"503 Service Unavailable")
}

pub fn is_read_request(request: &Request) -> bool {
    matches!(request.method(), Method::Get | Method::Head)
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_body(request: Request, status: u16, body: &[u8]) -> Result<()> {
    if is_head_request(&request) {
        let response =
            Response::empty(StatusCode(status)).with_header(make_header("Content-Type", PLAIN));
        return request.respond(response).map_err(Into::into);
    }

    let response = Response::from_data(body.to_vec())
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", PLAIN));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &str, value: &str) -> Header {
    // Both halves are ASCII constants or decimal digits.
    Header::from_bytes(key.as_bytes(), value.as_bytes())
        .unwrap_or_else(|()| unreachable!("invalid header {key}: {value}"))
}
