//! Inbound request model.
//!
//! # Responsibilities
//! - Build an absolute URL from the request target and `Host` header
//! - Parse cookies once, up front
//! - Keep the buffered body alongside headers
//!
//! # Design Decisions
//! - Immutable once built; shared as `Arc<Request>` across the pipeline
//! - Host lookups use the URL host, which never carries the port

use axum::body::Bytes;
use axum::http::{header, request::Parts, HeaderMap, Method};
use url::Url;

use crate::http::cookie::Cookie;

/// Error building a [`Request`] from wire parts.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("invalid request url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// A received HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    cookies: Vec<Cookie>,
    body: Bytes,
}

impl Request {
    pub fn new(method: Method, url: Url, headers: HeaderMap, body: Bytes) -> Self {
        let cookies = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(Cookie::parse_header)
            .collect();
        Self {
            method,
            url,
            headers,
            cookies,
            body,
        }
    }

    /// Build from axum request parts.
    ///
    /// Origin-form targets (`/path?q`) are made absolute using the `Host`
    /// header, falling back to `localhost`.
    pub fn from_parts(parts: &Parts, body: Bytes) -> Result<Self, RequestError> {
        let uri = &parts.uri;
        let raw = if uri.scheme().is_some() && uri.authority().is_some() {
            uri.to_string()
        } else {
            let host = parts
                .headers
                .get(header::HOST)
                .and_then(|h| h.to_str().ok())
                .filter(|h| !h.is_empty())
                .unwrap_or("localhost");
            let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
            format!("http://{host}{target}")
        };

        let url = Url::parse(&raw).map_err(|source| RequestError::InvalidUrl { url: raw, source })?;
        Ok(Self::new(parts.method.clone(), url, parts.headers.clone(), body))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Host used for document root lookup (empty if the URL has none).
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or("")
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(uri: &str, host: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().method(Method::GET).uri(uri);
        if let Some(host) = host {
            builder = builder.header(header::HOST, host);
        }
        builder.header(header::COOKIE, "a=1; b=2").body(()).unwrap().into_parts().0
    }

    #[test]
    fn origin_form_uses_host_header() {
        let req = Request::from_parts(&parts("/blog/?page=2", Some("example.com:8080")), Bytes::new()).unwrap();
        assert_eq!(req.url().as_str(), "http://example.com:8080/blog/?page=2");
        assert_eq!(req.host(), "example.com");
        assert_eq!(req.url().query(), Some("page=2"));
        assert_eq!(req.cookies().len(), 2);
    }

    #[test]
    fn missing_host_falls_back_to_localhost() {
        let req = Request::from_parts(&parts("/index.html", None), Bytes::new()).unwrap();
        assert_eq!(req.host(), "localhost");
    }

    #[test]
    fn absolute_form_is_kept() {
        let req = Request::from_parts(&parts("http://other.org/x", Some("ignored")), Bytes::new()).unwrap();
        assert_eq!(req.host(), "other.org");
    }
}
