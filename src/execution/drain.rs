//! Copy an execution object's output onto the HTTP reply.

use axum::http::{HeaderName, HeaderValue, Method, StatusCode};

use crate::component::Outbound;
use crate::http::{Reply, ReplyError, Request};

/// Apply `outbound` to `reply` and close it.
///
/// The body is only written for GET and POST; any other method gets the
/// status, headers and cookies alone.
pub fn apply(outbound: Outbound, request: &Request, reply: &mut Reply) -> Result<(), ReplyError> {
    if let Some(code) = outbound.status {
        match StatusCode::from_u16(code) {
            Ok(status) => reply.set_status(status),
            Err(_) => tracing::warn!(status = code, "Ignoring invalid component status"),
        }
    }

    for (name, value) in &outbound.response_header {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => reply.set_header(name, value),
            _ => tracing::warn!(header = %name, "Ignoring invalid component header"),
        }
    }

    let cookies = outbound
        .response_cookies
        .iter()
        .map(|(name, fields)| fields.to_cookie(name))
        .collect();
    reply.set_cookies(cookies);

    let method = request.method();
    if method == Method::GET || method == Method::POST {
        reply.write(&outbound.out)?;
    }
    reply.close()
}
