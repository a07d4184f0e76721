//! Built-in error pages.
//!
//! Rendered when a request has no error document to execute, or has
//! already gone through the configured number of error documents.

use axum::http::StatusCode;

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// File name of the error document for `status`.
pub fn error_document_name(status: StatusCode, extension: &str) -> String {
    format!("{}.{}", status.as_u16(), extension)
}

pub fn fallback_document(status: StatusCode, message: &str) -> String {
    let title = match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    };
    let message = escape_html(message);
    let detail = if status.is_redirection() {
        format!("<p>Moved to <a href=\"{message}\">{message}</a></p>")
    } else {
        format!("<p>{message}</p>")
    };
    format!(
        "<!DOCTYPE html>\n<html><head><title>{title}</title></head>\
         <body><h1>{title}</h1>{detail}</body></html>\n"
    )
}
