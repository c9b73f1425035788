//! Writing replies to `tiny_http` requests.

use std::io::Cursor;

use anyhow::Result;
use tiny_http::{Header, Request, Response, StatusCode};

use super::handler::Reply;
use crate::utils::mime::types::PLAIN;

/// Send `reply` as the response to `request`.
pub fn respond(request: Request, reply: Reply) -> Result<()> {
    let length = reply.body.len();
    let mut response = Response::new(
        StatusCode(reply.status),
        vec![make_header("Content-Type", reply.content_type)],
        Cursor::new(reply.body),
        Some(length),
        None,
    );
    if reply.status == 405 {
        response.add_header(make_header("Allow", "GET, HEAD"));
    }

    request.respond(response)?;
    Ok(())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    let response = Response::from_data(b"503 Service Unavailable".to_vec())
        .with_status_code(StatusCode(503))
        .with_header(make_header("Content-Type", PLAIN));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}
