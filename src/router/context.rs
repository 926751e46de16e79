// src/router/context.rs
use hyper::{Method, StatusCode};
use uuid::Uuid;

/// Per-request state threaded through routing and every log event.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub request_id: String,
}

impl RequestContext {
    /// Uses the caller's request id when one is supplied, otherwise a fresh UUID.
    pub fn new(method: Method, path: impl Into<String>, request_id: Option<String>) -> Self {
        let request_id = request_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            method,
            path: path.into(),
            request_id,
        }
    }
}

/// Status and plain-text body produced for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn empty(status: StatusCode) -> Self {
        Self::new(status, String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supplied_request_id_is_kept() {
        let ctx = RequestContext::new(Method::GET, "/disk", Some("abc-123".into()));
        assert_eq!(ctx.request_id, "abc-123");
    }

    #[test]
    fn test_missing_or_blank_request_id_is_generated() {
        for supplied in [None, Some(String::new()), Some("  ".into())] {
            let ctx = RequestContext::new(Method::GET, "/disk", supplied);
            assert!(Uuid::parse_str(&ctx.request_id).is_ok());
        }
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = RequestContext::new(Method::GET, "/disk", None);
        let b = RequestContext::new(Method::GET, "/disk", None);
        assert_ne!(a.request_id, b.request_id);
    }
}
