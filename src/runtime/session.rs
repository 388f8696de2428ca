use super::link::{BoundaryLink, BoundaryLinkLayer, Operation};
use super::{HEADER_SOURCE, OperationKind};
use crate::config::{BROWSER_SOURCE, SERVER_SOURCE};
use crate::domain::codec::BoundaryRecord;
use http::HeaderValue;
use std::sync::atomic::{AtomicU64, Ordering};
use tower::Layer;

/// Client-side handle, created once per browser session or server process and
/// passed to whatever issues procedure calls.
#[derive(Debug)]
pub struct ClientSession {
    source: HeaderValue,
    next_id: AtomicU64,
}

impl ClientSession {
    /// Session for code running in the browser.
    pub fn browser() -> Self {
        Self::with_source(HeaderValue::from_static(BROWSER_SOURCE))
    }

    /// Session for server-rendered code calling procedures directly.
    pub fn server() -> Self {
        Self::with_source(HeaderValue::from_static(SERVER_SOURCE))
    }

    pub fn with_source(source: HeaderValue) -> Self {
        Self {
            source,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn source(&self) -> &str {
        self.source.to_str().unwrap_or_default()
    }

    /// New operation tagged with this session's source. `boundary` is the
    /// record stamped at the call site, if any.
    pub fn operation(
        &self,
        kind: OperationKind,
        path: impl Into<String>,
        boundary: Option<BoundaryRecord>,
    ) -> Operation {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut op = Operation::new(id, kind, path);
        op.context.boundary = boundary;
        op.context
            .headers
            .insert(HEADER_SOURCE, self.source.clone());
        op
    }

    /// Install the boundary link in front of `transport`.
    pub fn link<S>(&self, transport: S) -> BoundaryLink<S> {
        BoundaryLinkLayer::new().layer(transport)
    }
}
