//! Configuration for the build-time Injector and the server-side logger.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Environment variable Next.js sets to `edge` inside the edge runtime.
pub const RUNTIME_ENV: &str = "NEXT_RUNTIME";

/// Route prefix the tRPC HTTP handler is mounted on.
pub const DEFAULT_ENDPOINT: &str = "/api/trpc";

/// `x-trpc-source` value sent by browser clients.
pub const BROWSER_SOURCE: &str = "nextjs-react";

/// `x-trpc-source` value sent by server-side callers.
pub const SERVER_SOURCE: &str = "rsc";

/// Injector options, as handed over by a build pipeline in JSON
/// (`{"debug": true, "projectRoot": "/repo"}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InjectorConfig {
    /// Log every processed and transformed module at info level.
    pub debug: bool,
    /// Overrides the root that stamped file paths are made relative to.
    pub project_root: Option<PathBuf>,
}

impl InjectorConfig {
    /// Parse JSON options. Malformed input yields the defaults; a build must
    /// never fail because of the plugin configuration.
    pub fn from_json(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str(raw) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring malformed injector config: {}", e);
                Self::default()
            }
        }
    }
}

/// Which server runtime is handling requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeTag {
    #[default]
    Node,
    Edge,
}

impl RuntimeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeTag::Node => "node",
            RuntimeTag::Edge => "edge",
        }
    }

    /// `edge` when the runtime variable says so, `node` otherwise.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some("edge") => RuntimeTag::Edge,
            _ => RuntimeTag::Node,
        }
    }

    pub fn detect() -> Self {
        Self::from_env_value(std::env::var(RUNTIME_ENV).ok().as_deref())
    }
}

impl std::fmt::Display for RuntimeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Path prefix used to recover procedure names from the request URL.
    pub endpoint: String,
    /// `x-trpc-source` value that marks a request as coming from the browser.
    pub client_source: String,
    pub runtime: RuntimeTag,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            client_source: BROWSER_SOURCE.to_string(),
            runtime: RuntimeTag::Node,
        }
    }
}

impl LoggerConfig {
    /// Defaults, with the runtime taken from the process environment.
    pub fn from_env() -> Self {
        Self {
            runtime: RuntimeTag::detect(),
            ..Self::default()
        }
    }

    pub fn with_runtime(mut self, runtime: RuntimeTag) -> Self {
        self.runtime = runtime;
        self
    }
}
