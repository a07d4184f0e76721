//! Outbound reply with a single open → closed transition.
//!
//! # Responsibilities
//! - Accumulate status, headers, cookies and body while open
//! - Deliver exactly one finished response to the connection task
//! - Reject writes and closes once closed
//!
//! # Design Decisions
//! - The body is buffered and handed over on close
//! - A reply dropped while open closes itself with a bare 500, so the
//!   connection never waits on a reply nobody owns anymore

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Response, StatusCode};
use tokio::sync::oneshot;

use crate::http::cookie::Cookie;

/// Error for operations on a closed reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReplyError {
    #[error("reply is already closed")]
    Closed,
}

/// The response side of one HTTP transaction.
#[derive(Debug)]
pub struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    cookies: Vec<Cookie>,
    body: Vec<u8>,
    sink: Option<oneshot::Sender<Response<Bytes>>>,
}

/// Receives the response once the paired [`Reply`] closes.
#[derive(Debug)]
pub struct ReplyReceiver {
    rx: oneshot::Receiver<Response<Bytes>>,
}

impl Reply {
    /// Create an open reply (status 200) and the receiver for its response.
    pub fn channel() -> (Reply, ReplyReceiver) {
        let (tx, rx) = oneshot::channel();
        let reply = Reply {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            cookies: Vec::new(),
            body: Vec::new(),
            sink: Some(tx),
        };
        (reply, ReplyReceiver { rx })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Replace any existing value for `name`.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Add a value for `name`, keeping existing ones.
    pub fn append_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.append(name, value);
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn set_cookies(&mut self, cookies: Vec<Cookie>) {
        self.cookies = cookies;
    }

    pub fn is_closed(&self) -> bool {
        self.sink.is_none()
    }

    /// Append to the body.
    pub fn write(&mut self, data: &[u8]) -> Result<(), ReplyError> {
        if self.is_closed() {
            return Err(ReplyError::Closed);
        }
        self.body.extend_from_slice(data);
        Ok(())
    }

    /// Finish the reply and hand the response to the connection.
    pub fn close(&mut self) -> Result<(), ReplyError> {
        let sink = self.sink.take().ok_or(ReplyError::Closed)?;

        let mut response = Response::new(Bytes::from(std::mem::take(&mut self.body)));
        *response.status_mut() = self.status;
        *response.headers_mut() = std::mem::take(&mut self.headers);
        for cookie in &self.cookies {
            match HeaderValue::from_str(&cookie.to_set_cookie()) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(_) => tracing::warn!(cookie = %cookie.name, "Dropping cookie with invalid characters"),
            }
        }

        // The receiver is gone when the client disconnected first.
        if sink.send(response).is_err() {
            tracing::debug!(status = %self.status, "Reply closed after client went away");
        }
        Ok(())
    }
}

impl Drop for Reply {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.take() {
            tracing::warn!(status = %self.status, "Reply dropped while open, answering 500");
            let mut response = Response::new(Bytes::new());
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            let _ = sink.send(response);
        }
    }
}

impl ReplyReceiver {
    /// Wait for the reply to close.
    pub async fn recv(self) -> Response<Bytes> {
        match self.rx.await {
            Ok(response) => response,
            Err(_) => {
                let mut response = Response::new(Bytes::new());
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                response
            }
        }
    }
}
