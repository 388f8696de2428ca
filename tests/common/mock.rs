//! In-memory port implementations for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use trpc_boundary_inspector::domain::ports::{ModuleSource, SourceReader};

/// Mock SourceReader that serves content from an in-memory map.
pub struct MockSourceReader {
    files: HashMap<PathBuf, String>,
}

impl MockSourceReader {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
        }
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, content: impl Into<String>) -> Self {
        self.files
            .insert(path.as_ref().to_path_buf(), content.into());
        self
    }
}

impl Default for MockSourceReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceReader for MockSourceReader {
    fn read(&self, path: &Path) -> Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("File not found: {}", path.display()))
    }
}

/// Mock ModuleSource returning a fixed module list, or failing like a
/// missing scan root.
pub struct MockModuleSource {
    modules: Option<Vec<PathBuf>>,
}

impl MockModuleSource {
    pub fn with_modules(modules: &[&str]) -> Self {
        Self {
            modules: Some(modules.iter().map(PathBuf::from).collect()),
        }
    }

    pub fn failing() -> Self {
        Self { modules: None }
    }
}

impl ModuleSource for MockModuleSource {
    fn modules(&self, root: &Path) -> Result<Vec<PathBuf>> {
        self.modules
            .clone()
            .ok_or_else(|| anyhow!("Cannot access scan root: {}", root.display()))
    }
}
