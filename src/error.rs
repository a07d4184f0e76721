//! Error taxonomy for the request pipeline.
//!
//! None of these escape the pipeline: each one is rendered into a closed
//! reply by re-entering the router's error path with [`PipelineError::status`]
//! and [`PipelineError::message`].

use axum::http::StatusCode;

/// A failure that ends the normal path of a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// The resource does not exist under the document root.
    #[error("not found: {0}")]
    NotFound(String),

    /// Dotfile, traversal attempt or unreadable resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Directory requested without a trailing slash.
    #[error("moved permanently to {0}")]
    Redirect(String),

    /// The script engine rejected the component source.
    #[error("component failed to compile: {0}")]
    Compilation(String),

    /// A remote document root uses a scheme nobody handles.
    #[error("no protocol handler for scheme {scheme:?} ({url})")]
    NoProtocolHandler { scheme: String, url: String },

    /// A remote fetch failed.
    #[error("upstream request failed: {0}")]
    Upstream(String),

    /// A pending transaction outlived its deadline.
    #[error("timed out waiting for {0}")]
    Timeout(String),

    /// The unit behind a pending transaction went away before completing.
    #[error("{0} was destroyed before completing")]
    Abandoned(String),
}

impl PipelineError {
    /// Status code the error is rendered with.
    pub fn status(&self) -> StatusCode {
        match self {
            PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
            PipelineError::Forbidden(_) | PipelineError::NoProtocolHandler { .. } => {
                StatusCode::FORBIDDEN
            }
            PipelineError::Redirect(_) => StatusCode::MOVED_PERMANENTLY,
            PipelineError::Compilation(_) | PipelineError::Abandoned(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            PipelineError::Upstream(_) => StatusCode::BAD_GATEWAY,
            PipelineError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Message handed to the error document.
    ///
    /// For most errors this is the request URL or the diagnostic; for a
    /// redirect it is the new location.
    pub fn message(&self) -> String {
        match self {
            PipelineError::NotFound(m)
            | PipelineError::Forbidden(m)
            | PipelineError::Redirect(m)
            | PipelineError::Compilation(m)
            | PipelineError::Upstream(m) => m.clone(),
            PipelineError::NoProtocolHandler { url, .. } => url.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_taxonomy() {
        assert_eq!(PipelineError::NotFound("/x".into()).status(), 404);
        assert_eq!(PipelineError::Forbidden("/.git".into()).status(), 403);
        assert_eq!(PipelineError::Redirect("/blog/".into()).status(), 301);
        assert_eq!(PipelineError::Compilation("bad".into()).status(), 500);
        let no_handler = PipelineError::NoProtocolHandler {
            scheme: "s3".into(),
            url: "s3://bucket/key".into(),
        };
        assert_eq!(no_handler.status(), 403);
        assert_eq!(no_handler.message(), "s3://bucket/key");
        assert_eq!(PipelineError::Timeout("tx-1".into()).status(), 504);
    }

    #[test]
    fn redirect_message_is_location() {
        let err = PipelineError::Redirect("http://example.com/blog/?page=2".into());
        assert_eq!(err.message(), "http://example.com/blog/?page=2");
    }
}
