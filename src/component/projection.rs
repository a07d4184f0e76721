//! Request and response projections exchanged with execution objects.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::http::{Cookie, Request};

/// Cookie attributes as seen by components. Absent fields keep the wire
/// default when the cookie is rebuilt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<bool>,
}

impl CookieFields {
    /// All fields of an existing cookie.
    pub fn from_cookie(cookie: &Cookie) -> Self {
        Self {
            value: Some(cookie.value.clone()),
            expires: cookie.expires,
            domain: cookie.domain.clone(),
            path: cookie.path.clone(),
            secure: Some(cookie.secure),
            session: Some(cookie.is_session()),
        }
    }

    /// Rebuild a wire cookie named `name`.
    ///
    /// `session = true` wins over an expiry.
    pub fn to_cookie(&self, name: &str) -> Cookie {
        let mut cookie = Cookie::new(name, self.value.clone().unwrap_or_default());
        cookie.expires = match self.session {
            Some(true) => None,
            _ => self.expires,
        };
        cookie.domain = self.domain.clone();
        cookie.path = self.path.clone();
        cookie.secure = self.secure.unwrap_or(false);
        cookie
    }
}

/// What an execution object sees of the request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Inbound {
    pub method: String,
    pub scheme: String,
    pub host: String,
    pub path: String,
    /// Query string without the leading `?`; empty when absent.
    pub query: String,
    /// Raw body, lossily decoded as UTF-8.
    pub data: String,
    pub request_header: BTreeMap<String, String>,
    pub request_cookies: BTreeMap<String, CookieFields>,
    /// Context from the router, e.g. the failing URL for error documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Inbound {
    pub fn from_request(request: &Request, message: Option<String>) -> Self {
        let url = request.url();

        // Repeated headers are folded into one comma-separated value.
        let mut request_header: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in request.headers() {
            let value = String::from_utf8_lossy(value.as_bytes());
            request_header
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert_with(|| value.into_owned());
        }

        let request_cookies = request
            .cookies()
            .iter()
            .map(|cookie| (cookie.name.clone(), CookieFields::from_cookie(cookie)))
            .collect();

        Self {
            method: request.method().as_str().to_string(),
            scheme: url.scheme().to_string(),
            host: url.host_str().unwrap_or_default().to_string(),
            path: url.path().to_string(),
            query: url.query().unwrap_or_default().to_string(),
            data: String::from_utf8_lossy(request.body()).into_owned(),
            request_header,
            request_cookies,
            message,
        }
    }
}

/// What an execution object produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Outbound {
    /// `None` keeps the status the router already set on the reply.
    pub status: Option<u16>,
    pub response_header: BTreeMap<String, String>,
    pub response_cookies: BTreeMap<String, CookieFields>,
    pub out: Vec<u8>,
}
