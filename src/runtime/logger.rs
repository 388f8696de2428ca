//! Server-side recovery of boundary metadata from an incoming request.
//!
//! Everything here is total: missing, corrupt or hostile input narrows what
//! gets reported, it never fails the request.

use super::{
    BATCH_SEPARATOR, BOUNDARY_QUERY_KEY, HEADER_FILE, HEADER_LINE, HEADER_PATH, HEADER_SIDE,
    HEADER_SOURCE, HEADER_TYPE, NO_PATH, ROUTER_ID,
};
use crate::config::{LoggerConfig, RuntimeTag};
use crate::domain::boundary::Side;
use crate::domain::codec::decode;
use http::{HeaderMap, Method, Uri};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// What the server learned about one logical call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub runtime: RuntimeTag,
    pub side: Side,
    pub kind: String,
    pub procedure: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tRPC [{}][{}] [{}] {}",
            self.runtime, self.side, self.kind, self.procedure
        )?;
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, " from {file}:{line}"),
            (Some(file), None) => write!(f, " from {file}"),
            _ => Ok(()),
        }
    }
}

fn header<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn decode_lossy(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Request-level fallbacks shared by every call of a batch.
struct RequestDefaults {
    kind: String,
    side: Side,
    file: Option<String>,
    line: Option<u32>,
}

pub struct BoundaryLogger {
    config: LoggerConfig,
}

impl BoundaryLogger {
    pub fn new(config: LoggerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Procedure list segment of a request URL, outer encoding removed.
    fn path_from_uri(&self, uri: &Uri) -> Option<String> {
        let prefix = format!("{}/", self.config.endpoint.trim_end_matches('/'));
        let path = uri.path();
        let start = path.find(&prefix)? + prefix.len();
        let segment = &path[start..];
        let segment = segment.split(['?', '#']).next().unwrap_or_default();
        (!segment.is_empty()).then(|| decode_lossy(segment))
    }

    fn defaults(&self, headers: &HeaderMap, method: Option<&Method>) -> RequestDefaults {
        let kind = match header(headers, HEADER_TYPE) {
            Some(kind) => kind.to_string(),
            None if method == Some(&Method::POST) => "mutation".to_string(),
            None => "query".to_string(),
        };
        let side = header(headers, HEADER_SIDE)
            .and_then(Side::parse)
            .unwrap_or_else(|| {
                if header(headers, HEADER_SOURCE) == Some(self.config.client_source.as_str()) {
                    Side::Client
                } else {
                    Side::Server
                }
            });
        RequestDefaults {
            kind,
            side,
            file: header(headers, HEADER_FILE).map(str::to_string),
            line: header(headers, HEADER_LINE).and_then(|l| l.parse().ok()),
        }
    }

    /// Resolve the logical calls of a request without emitting anything.
    pub fn resolve(
        &self,
        headers: &HeaderMap,
        uri: Option<&Uri>,
        method: Option<&Method>,
    ) -> Vec<LogEntry> {
        let list = match header(headers, HEADER_PATH) {
            Some(path) if path != NO_PATH => Some(path.to_string()),
            _ => uri.and_then(|u| self.path_from_uri(u)),
        };
        let Some(list) = list else {
            return Vec::new();
        };
        if is_suppressed(&list) {
            return Vec::new();
        }

        let defaults = self.defaults(headers, method);
        list.split(BATCH_SEPARATOR)
            .filter_map(|part| self.entry(part, &defaults))
            .collect()
    }

    fn entry(&self, part: &str, defaults: &RequestDefaults) -> Option<LogEntry> {
        let (name, query) = match part.split_once('?') {
            Some((name, query)) => (name, Some(query)),
            None => (part, None),
        };
        let procedure = decode_lossy(name.trim());
        if is_suppressed(&procedure) {
            return None;
        }

        let mut entry = LogEntry {
            runtime: self.config.runtime,
            side: defaults.side,
            kind: defaults.kind.clone(),
            procedure,
            file: defaults.file.clone(),
            line: defaults.line,
        };

        let token = query.and_then(|q| {
            q.split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(key, _)| *key == BOUNDARY_QUERY_KEY)
                .map(|(_, value)| value)
        });
        if let Some(token) = token {
            let decoded = decode(token);
            if decoded.file.is_some() {
                entry.file = decoded.file;
            }
            if decoded.line.is_some() {
                entry.line = decoded.line;
            }
            if let Some(side) = decoded.side {
                entry.side = side;
            }
        }
        Some(entry)
    }

    /// Resolve and emit one structured event per logical call.
    pub fn log(
        &self,
        headers: &HeaderMap,
        uri: Option<&Uri>,
        method: Option<&Method>,
    ) -> Vec<LogEntry> {
        let entries = self.resolve(headers, uri, method);
        for entry in &entries {
            info!(
                target: "trpc_boundary",
                runtime = %entry.runtime,
                side = %entry.side,
                kind = %entry.kind,
                procedure = %entry.procedure,
                file = entry.file.as_deref(),
                line = entry.line,
                "{}",
                entry
            );
        }
        entries
    }
}

impl Default for BoundaryLogger {
    fn default() -> Self {
        Self::new(LoggerConfig::default())
    }
}

fn is_suppressed(path: &str) -> bool {
    path.is_empty() || path == NO_PATH || path == ROUTER_ID
}
