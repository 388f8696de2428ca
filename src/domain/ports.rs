use crate::domain::call::CallSite;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Source code reader port
pub trait SourceReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<String>;
}

/// Enumerates the source modules of a project (implemented by Infrastructure)
pub trait ModuleSource: Send + Sync {
    /// Absolute module paths, in a deterministic order.
    fn modules(&self, root: &Path) -> Result<Vec<PathBuf>>;
}

/// Syntax port: finds call expressions whose callee is a plain dotted chain.
pub trait CallSiteExtractor: Send + Sync {
    /// Call sites in source order. `file` names the module (its extension
    /// selects the grammar) and is copied into every returned site.
    ///
    /// Fails when the module cannot be parsed.
    fn call_sites(&self, source: &str, file: &str) -> Result<Vec<CallSite>>;
}
