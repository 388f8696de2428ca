//! Request-time half of the boundary pipeline: the client link that puts
//! stamped metadata on the wire, and the server logger that reads it back.

pub mod batch;
pub mod link;
pub mod logger;
pub mod session;

use serde::{Deserialize, Serialize};
use std::fmt;

pub const HEADER_TYPE: &str = "x-trpc-boundary-type";
pub const HEADER_PATH: &str = "x-trpc-boundary-path";
pub const HEADER_FILE: &str = "x-trpc-boundary-file";
pub const HEADER_LINE: &str = "x-trpc-boundary-line";
pub const HEADER_SIDE: &str = "x-trpc-boundary-side";
pub const HEADER_SOURCE: &str = "x-trpc-source";

/// Query key carrying the per-call token on an operation path.
pub const BOUNDARY_QUERY_KEY: &str = "__b";

/// Path value meaning "no path known"; the URL is consulted instead.
pub const NO_PATH: &str = "NONE";

/// Bare router identifier, never a procedure.
pub const ROUTER_ID: &str = "trpc";

/// Separator between procedure paths of a batched request.
pub const BATCH_SEPARATOR: char = ',';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
