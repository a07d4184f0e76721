//! Cookie model shared by requests, replies and component projections.
//!
//! # Responsibilities
//! - Parse the inbound `Cookie` header into name/value pairs
//! - Render outbound cookies as `Set-Cookie` header values
//!
//! # Design Decisions
//! - A cookie without an expiry is a session cookie
//! - Expiry is rendered as an IMF-fixdate in GMT

use chrono::{DateTime, Utc};

use crate::http::HTTP_DATE_FORMAT;

/// A single HTTP cookie.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    /// `None` for session cookies.
    pub expires: Option<DateTime<Utc>>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    /// True when the cookie lives only as long as the browser session.
    pub fn is_session(&self) -> bool {
        self.expires.is_none()
    }

    /// Parse the value of a request `Cookie` header (`a=1; b=2`).
    ///
    /// Pairs without `=` or with an empty name are skipped.
    pub fn parse_header(value: &str) -> Vec<Cookie> {
        value
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some(Cookie::new(name, value.trim().trim_matches('"')))
            })
            .collect()
    }

    /// Render as a `Set-Cookie` header value.
    pub fn to_set_cookie(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        if let Some(expires) = &self.expires {
            out.push_str("; Expires=");
            out.push_str(&expires.format(HTTP_DATE_FORMAT).to_string());
        }
        if let Some(domain) = &self.domain {
            out.push_str("; Domain=");
            out.push_str(domain);
        }
        if let Some(path) = &self.path {
            out.push_str("; Path=");
            out.push_str(path);
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        out
    }
}
