use crate::runtime::logger::{BoundaryLogger, LogEntry};
use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
};
use std::sync::Arc;

/// Boundary entries resolved for the current request, available to handlers
/// through `Extension<BoundaryEntries>`.
#[derive(Debug, Clone, Default)]
pub struct BoundaryEntries(pub Vec<LogEntry>);

impl BoundaryEntries {
    pub fn entries(&self) -> &[LogEntry] {
        &self.0
    }
}

/// Logs every logical call of the request before it reaches the handler.
pub async fn boundary_logging(
    State(logger): State<Arc<BoundaryLogger>>,
    mut request: Request,
    next: Next,
) -> Response {
    let entries = logger.log(request.headers(), Some(request.uri()), Some(request.method()));
    request.extensions_mut().insert(BoundaryEntries(entries));
    next.run(request).await
}

/// Wrap every route of `router` with [`boundary_logging`].
pub fn with_boundary_logging<S>(router: Router<S>, logger: Arc<BoundaryLogger>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(logger, boundary_logging))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoggerConfig, RuntimeTag};
    use crate::runtime::{HEADER_PATH, HEADER_SOURCE};
    use axum::{Extension, body::Body, routing::get};
    use tower::ServiceExt;

    async fn procedures(Extension(entries): Extension<BoundaryEntries>) -> String {
        entries
            .entries()
            .iter()
            .map(|e| format!("{}@{}", e.procedure, e.side))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn app(runtime: RuntimeTag) -> Router {
        let logger = Arc::new(BoundaryLogger::new(
            LoggerConfig::default().with_runtime(runtime),
        ));
        let router = Router::new().route("/api/trpc/{*procedures}", get(procedures).post(procedures));
        with_boundary_logging(router, logger)
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_entries_reach_handler() {
        let request = axum::http::Request::builder()
            .uri("/api/trpc/user.get?batch=1")
            .header(HEADER_PATH, "user.get")
            .header(HEADER_SOURCE, "nextjs-react")
            .body(Body::empty())
            .unwrap();

        let response = app(RuntimeTag::Node).oneshot(request).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(body_text(response).await, "user.get@client");
    }

    #[tokio::test]
    async fn test_url_fallback_without_headers() {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/api/trpc/post.create%2Cpost.like")
            .body(Body::empty())
            .unwrap();

        let response = app(RuntimeTag::Edge).oneshot(request).await.unwrap();
        assert_eq!(body_text(response).await, "post.create@server,post.like@server");
    }

    #[tokio::test]
    async fn test_bare_router_request_yields_no_entries() {
        let request = axum::http::Request::builder()
            .uri("/api/trpc/trpc")
            .body(Body::empty())
            .unwrap();

        let response = app(RuntimeTag::Node).oneshot(request).await.unwrap();
        assert_eq!(body_text(response).await, "");
    }
}
