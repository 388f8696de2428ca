use crate::domain::ports::ModuleSource;
use anyhow::{Context, Result, bail};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extensions of modules the scanner and the transform look at.
pub const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx"];

/// Dependency directories, always excluded.
pub const DEPENDENCY_DIRS: &[&str] = &["node_modules"];

pub fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e))
}

pub fn is_dependency_path(path: &Path) -> bool {
    path.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|s| DEPENDENCY_DIRS.contains(&s))
    })
}

/// `./`-prefixed, `/`-separated path of `path` relative to `root`. Paths
/// outside `root` are rendered as given.
pub fn relative_display(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) => {
            let parts: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            format!("./{}", parts.join("/"))
        }
        Err(_) => path.to_string_lossy().replace('\\', "/"),
    }
}

/// Files marking the root of a JavaScript project.
pub const PROJECT_MARKERS: &[&str] = &[
    "package.json",
    "next.config.js",
    "next.config.mjs",
    "next.config.cjs",
    "next.config.ts",
];

/// Nearest ancestor directory of `path` holding one of [`PROJECT_MARKERS`].
pub fn project_root_of(path: &Path) -> Option<&Path> {
    path.ancestors()
        .skip(1)
        .find(|dir| PROJECT_MARKERS.iter().any(|m| dir.join(m).is_file()))
}

/// Path a module is classified by: relative to its enclosing project when one
/// is found, the full path otherwise. Independent of which directory a scan
/// starts from.
pub fn classification_path(path: &Path) -> PathBuf {
    project_root_of(path)
        .and_then(|root| path.strip_prefix(root).ok())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| path.to_path_buf())
}

/// Deterministic directory walker with ignore patterns.
///
/// Each pattern `p` excludes both `**/p/**` and `**/p`, i.e. a directory of
/// that name with everything below it, or a file of that name.
pub struct SourceWalker {
    ignore: GlobSet,
}

impl SourceWalker {
    pub fn new(ignore_patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        let patterns = DEPENDENCY_DIRS
            .iter()
            .map(|s| s.to_string())
            .chain(ignore_patterns.iter().cloned());
        for pattern in patterns {
            let pattern = pattern.trim_matches('/');
            if pattern.is_empty() {
                continue;
            }
            for glob in [format!("**/{pattern}/**"), format!("**/{pattern}")] {
                builder.add(
                    Glob::new(&glob).with_context(|| format!("Invalid ignore pattern: {pattern}"))?,
                );
            }
            debug!("Added ignore pattern: {}", pattern);
        }
        let ignore = builder.build().context("Failed to build ignore patterns")?;
        Ok(Self { ignore })
    }

    pub fn is_ignored(&self, relative: &Path) -> bool {
        self.ignore.is_match(relative)
    }
}

impl ModuleSource for SourceWalker {
    fn modules(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let meta = std::fs::metadata(root)
            .with_context(|| format!("Cannot access scan root: {}", root.display()))?;
        if !meta.is_dir() {
            bail!("Scan root is not a directory: {}", root.display());
        }

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || entry
                        .path()
                        .strip_prefix(root)
                        .map(|rel| !self.is_ignored(rel))
                        .unwrap_or(true)
            });

        let mut modules = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(anyhow::Error::new(err)
                        .context(format!("Failed to traverse {}", root.display())));
                }
                Err(err) => {
                    warn!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };
            if entry.file_type().is_file() && has_source_extension(entry.path()) {
                modules.push(entry.into_path());
            }
        }

        debug!("Collected {} modules under {}", modules.len(), root.display());
        Ok(modules)
    }
}
