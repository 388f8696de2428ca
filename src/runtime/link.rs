use super::{
    BOUNDARY_QUERY_KEY, HEADER_FILE, HEADER_LINE, HEADER_PATH, HEADER_SIDE, HEADER_TYPE,
    OperationKind,
};
use crate::domain::codec::{BoundaryRecord, encode};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::debug;

/// Per-operation context; `boundary` is whatever the Injector stamped at the
/// call site.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    pub boundary: Option<BoundaryRecord>,
    pub headers: HeaderMap,
}

/// One outgoing procedure invocation.
#[derive(Debug, Clone)]
pub struct Operation {
    pub id: u64,
    pub kind: OperationKind,
    /// Logical procedure path. After annotation a stamped operation carries
    /// `?__b=<token>` here.
    pub path: String,
    pub context: OperationContext,
}

impl Operation {
    pub fn new(id: u64, kind: OperationKind, path: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            path: path.into(),
            context: OperationContext::default(),
        }
    }

    pub fn with_boundary(mut self, record: BoundaryRecord) -> Self {
        self.context.boundary = Some(record);
        self
    }

    /// Path without any boundary suffix.
    pub fn logical_path(&self) -> &str {
        self.path
            .split_once('?')
            .map(|(name, _)| name)
            .unwrap_or(&self.path)
    }
}

fn set_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    // Values that are not valid header text are left off; the path suffix
    // still carries them.
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(HeaderName::from_static(name), v);
        }
        Err(_) => debug!("Not sending {} header: value is not header-safe", name),
    }
}

fn boundary_suffix(record: &BoundaryRecord) -> String {
    format!("?{BOUNDARY_QUERY_KEY}={}", encode(record))
}

/// Attach boundary metadata to an operation. Idempotent.
pub fn annotate(op: &mut Operation) {
    let logical = op.logical_path().to_string();
    let headers = &mut op.context.headers;
    set_header(headers, HEADER_TYPE, op.kind.as_str());
    set_header(headers, HEADER_PATH, &logical);

    let Some(record) = op.context.boundary.as_ref() else {
        return;
    };
    set_header(headers, HEADER_FILE, &record.file);
    set_header(headers, HEADER_LINE, &record.line.to_string());
    set_header(headers, HEADER_SIDE, record.side.as_str());
    op.path = format!("{logical}{}", boundary_suffix(record));
}

/// Tower layer installing [`BoundaryLink`] in front of a transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundaryLinkLayer;

impl BoundaryLinkLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for BoundaryLinkLayer {
    type Service = BoundaryLink<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BoundaryLink { inner }
    }
}

/// Annotates every operation synchronously, then hands it to the inner
/// service and returns the inner future as is.
#[derive(Debug, Clone)]
pub struct BoundaryLink<S> {
    inner: S,
}

impl<S> BoundaryLink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> Service<Operation> for BoundaryLink<S>
where
    S: Service<Operation>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut op: Operation) -> Self::Future {
        annotate(&mut op);
        self.inner.call(op)
    }
}
