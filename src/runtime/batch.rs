use super::link::Operation;
use super::{BATCH_SEPARATOR, HEADER_PATH, OperationKind};
use crate::config::DEFAULT_ENDPOINT;
use crate::domain::codec::COMPONENT;
use anyhow::{Context, Result, bail};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request};
use percent_encoding::utf8_percent_encode;

/// Several annotated operations sent as one HTTP request.
#[derive(Debug)]
pub struct BatchRequest;

impl BatchRequest {
    /// Coalesce operations against the default endpoint.
    pub fn coalesce(ops: &[Operation]) -> Result<Request<()>> {
        Self::coalesce_at(DEFAULT_ENDPOINT, ops)
    }

    /// Coalesce into `<endpoint>/<encoded paths>?batch=1`.
    ///
    /// Only headers every operation agrees on are sent; per-call metadata that
    /// differs between operations travels in each path's `?__b=` suffix.
    pub fn coalesce_at(endpoint: &str, ops: &[Operation]) -> Result<Request<()>> {
        let Some(first) = ops.first() else {
            bail!("Cannot coalesce an empty batch");
        };

        let joined = ops
            .iter()
            .map(|op| op.path.as_str())
            .collect::<Vec<_>>()
            .join(&BATCH_SEPARATOR.to_string());
        let uri = format!(
            "{}/{}?batch=1",
            endpoint.trim_end_matches('/'),
            utf8_percent_encode(&joined, COMPONENT)
        );

        let method = if ops.iter().all(|op| op.kind == OperationKind::Mutation) {
            Method::POST
        } else {
            Method::GET
        };

        let mut headers = common_headers(first, &ops[1..]);
        match HeaderValue::from_str(&joined) {
            Ok(v) => {
                headers.insert(HeaderName::from_static(HEADER_PATH), v);
            }
            Err(_) => {
                headers.remove(HEADER_PATH);
            }
        }

        let mut request = Request::builder()
            .method(method)
            .uri(uri.as_str())
            .body(())
            .with_context(|| format!("Invalid batch URI: {uri}"))?;
        *request.headers_mut() = headers;
        Ok(request)
    }
}

fn common_headers(first: &Operation, rest: &[Operation]) -> HeaderMap {
    let mut common = HeaderMap::new();
    for (name, value) in first.context.headers.iter() {
        let agreed = rest
            .iter()
            .all(|op| op.context.headers.get(name) == Some(value));
        if agreed {
            common.insert(name.clone(), value.clone());
        }
    }
    common
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::boundary::Side;
    use crate::domain::codec::BoundaryRecord;
    use crate::runtime::link::annotate;
    use crate::runtime::{HEADER_FILE, HEADER_TYPE};

    fn annotated(id: u64, kind: OperationKind, path: &str, rec: Option<BoundaryRecord>) -> Operation {
        let mut op = Operation::new(id, kind, path);
        op.context.boundary = rec;
        annotate(&mut op);
        op
    }

    #[test]
    fn test_single_operation_keeps_all_headers() {
        let op = annotated(
            1,
            OperationKind::Query,
            "hello",
            Some(BoundaryRecord::new("./a.ts", 3, Side::Client)),
        );
        let req = BatchRequest::coalesce(&[op]).unwrap();
        assert_eq!(req.method(), Method::GET);
        assert_eq!(
            req.uri().to_string(),
            "/api/trpc/hello%3F__b%3D.%252Fa.ts%253A3%253Aclient?batch=1"
        );
        assert_eq!(req.headers().get(HEADER_FILE).unwrap(), "./a.ts");
        assert_eq!(
            req.headers().get(HEADER_PATH).unwrap(),
            "hello?__b=.%2Fa.ts%3A3%3Aclient"
        );
    }

    #[test]
    fn test_mixed_batch_drops_disagreeing_headers() {
        let matched = annotated(
            1,
            OperationKind::Query,
            "user.get",
            Some(BoundaryRecord::new("./a.ts", 3, Side::Client)),
        );
        let unmatched = annotated(2, OperationKind::Query, "post.list", None);
        let req = BatchRequest::coalesce(&[matched, unmatched]).unwrap();

        assert_eq!(req.headers().get(HEADER_FILE), None);
        assert_eq!(req.headers().get(HEADER_TYPE).unwrap(), "query");
        assert_eq!(
            req.headers().get(HEADER_PATH).unwrap(),
            "user.get?__b=.%2Fa.ts%3A3%3Aclient,post.list"
        );
    }

    #[test]
    fn test_mutation_batch_is_post() {
        let op = annotated(1, OperationKind::Mutation, "post.create", None);
        let req = BatchRequest::coalesce_at("/trpc/", &[op]).unwrap();
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.uri().path(), "/trpc/post.create");
    }

    #[test]
    fn test_empty_batch_is_an_error() {
        assert!(BatchRequest::coalesce(&[]).is_err());
    }
}
