// src/server/handler.rs
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{Body, Request, Response};
use std::sync::Arc;
use tower::Service;

use crate::router::{RequestContext, RequestRouter};

/// Adapts hyper requests to the [`RequestRouter`].
#[derive(Clone)]
pub struct CheckHandler {
    router: Arc<RequestRouter>,
    request_id_header: HeaderName,
}

impl CheckHandler {
    pub fn new(router: Arc<RequestRouter>, request_id_header: HeaderName) -> Self {
        Self {
            router,
            request_id_header,
        }
    }
}

impl Service<Request<Body>> for CheckHandler {
    type Response = Response<Body>;
    type Error = Box<dyn std::error::Error + Send + Sync>;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let router = self.router.clone();
        let header = self.request_id_header.clone();
        Box::pin(async move {
            let supplied_id = req
                .headers()
                .get(&header)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            let ctx = RequestContext::new(req.method().clone(), req.uri().path(), supplied_id);

            let reply = router.handle(&ctx).await;

            let response = Response::builder()
                .status(reply.status)
                .header(CONTENT_TYPE, "text/plain; charset=utf-8")
                .header(header, HeaderValue::from_str(&ctx.request_id)?)
                .body(Body::from(reply.body))?;
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::test_helpers::write_script;
    use crate::check::{ProcessRunner, TargetResolver};
    use crate::router::TracingEvents;
    use hyper::{Method, StatusCode};
    use tower::ServiceExt;

    fn handler_for(root: &std::path::Path) -> CheckHandler {
        let router = RequestRouter::new(
            TargetResolver::new(root),
            Arc::new(ProcessRunner::default()),
            Arc::new(TracingEvents),
        );
        CheckHandler::new(Arc::new(router), HeaderName::from_static("x-request-id"))
    }

    async fn body_text(response: Response<Body>) -> String {
        let bytes = hyper::body::to_bytes(response.into_body()).await.expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf8")
    }

    #[tokio::test]
    async fn test_passing_check_response() {
        let root = tempfile::tempdir().expect("tempdir");
        write_script(root.path(), "disk", "exit 0");

        let request = Request::get("/disk")
            .header("x-request-id", "trace-42")
            .body(Body::empty())
            .expect("request");
        let response = handler_for(root.path()).oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-request-id"], "trace-42");
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(body_text(response).await, "CHECK PASSED\n");
    }

    #[tokio::test]
    async fn test_request_id_is_generated_when_absent() {
        let root = tempfile::tempdir().expect("tempdir");

        let request = Request::get("/nope").body(Body::empty()).expect("request");
        let response = handler_for(root.path()).oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let id = response.headers()["x-request-id"].to_str().expect("ascii");
        assert!(uuid::Uuid::parse_str(id).is_ok());
        assert_eq!(body_text(response).await, "");
    }

    #[tokio::test]
    async fn test_post_is_not_found() {
        let root = tempfile::tempdir().expect("tempdir");
        write_script(root.path(), "disk", "exit 0");

        let request = Request::builder()
            .method(Method::POST)
            .uri("/disk")
            .body(Body::empty())
            .expect("request");
        let response = handler_for(root.path()).oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "");
    }
}
