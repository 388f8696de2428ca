use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};
use std::sync::OnceLock;

/// Execution context a module runs in.
///
/// Variants are listed in precedence order: when a module carries several
/// signals, the earlier variant wins (Edge > Client > ServerRsc > Unknown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryLabel {
    Edge,
    Client,
    #[serde(rename = "Server (RSC)")]
    ServerRsc,
    Unknown,
}

impl BoundaryLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryLabel::Edge => "Edge",
            BoundaryLabel::Client => "Client",
            BoundaryLabel::ServerRsc => "Server (RSC)",
            BoundaryLabel::Unknown => "Unknown",
        }
    }

    /// Narrow to the side stamped into wire metadata. Only a client module is
    /// `client`; Edge and Unknown run server-side.
    pub fn side(&self) -> Side {
        match self {
            BoundaryLabel::Client => Side::Client,
            _ => Side::Server,
        }
    }
}

impl fmt::Display for BoundaryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side of the network a call originates from, as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Client,
    Server,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Client => "client",
            Side::Server => "server",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "client" => Some(Side::Client),
            "server" => Some(Side::Server),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conventional Next.js application-routing directory.
pub const APP_DIR_SEGMENT: &str = "app";

fn edge_runtime_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"export\s+const\s+runtime\s*=\s*['"]edge['"]"#).expect("edge runtime regex")
    })
}

/// `export const runtime = 'edge'` anywhere in the module.
pub fn is_edge_runtime(source: &str) -> bool {
    edge_runtime_regex().is_match(source)
}

/// Module starts (after leading whitespace) with a `"use client"` directive.
pub fn has_client_directive(source: &str) -> bool {
    let text = source.trim_start();
    text.starts_with("\"use client\"") || text.starts_with("'use client'")
}

/// Path contains an `app` directory segment (the file name itself does not count).
pub fn is_app_dir(path: &Path) -> bool {
    let mut components: Vec<Component<'_>> = path.components().collect();
    components.pop();
    components
        .iter()
        .any(|c| matches!(c, Component::Normal(name) if name.to_str() == Some(APP_DIR_SEGMENT)))
}

/// Classify a module by first-matching rule: edge runtime export, client
/// directive, app-router location, otherwise unknown.
pub fn classify(source: &str, path: &Path) -> BoundaryLabel {
    if is_edge_runtime(source) {
        return BoundaryLabel::Edge;
    }
    if has_client_directive(source) {
        return BoundaryLabel::Client;
    }
    if is_app_dir(path) {
        return BoundaryLabel::ServerRsc;
    }
    BoundaryLabel::Unknown
}
