//! Build-time Injector: stamps every matched remote call in a module with the
//! `__boundary` record it was written at.

use crate::adapters::fs::walker::{has_source_extension, is_dependency_path, relative_display};
use crate::adapters::typescript::parse_module;
use crate::adapters::typescript::rewrite::{apply_edits, plan_stamps};
use crate::config::InjectorConfig;
use crate::domain::boundary::{Side, classify};
use crate::domain::detector::TERMINAL_METHODS;
use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

fn candidate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let names = TERMINAL_METHODS.join("|");
        Regex::new(&format!(r"\.\s*(?:{names})\s*[<(]")).expect("terminal call regex")
    })
}

/// Cheap text check run before parsing: could this module contain a
/// matched call at all?
pub fn may_contain_calls(source: &str) -> bool {
    candidate_regex().is_match(source)
}

/// Result of stamping one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub code: String,
    /// Lines of the calls that were stamped, in source order.
    pub stamped_lines: Vec<u32>,
}

pub struct Injector {
    project_root: PathBuf,
    config: InjectorConfig,
}

impl Injector {
    pub fn new(project_root: impl Into<PathBuf>, config: InjectorConfig) -> Self {
        let project_root = config
            .project_root
            .clone()
            .unwrap_or_else(|| project_root.into());
        Self {
            project_root,
            config,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Stamp a module. Never fails: anything that cannot be transformed comes
    /// back exactly as it went in.
    pub fn transform(&self, path: &Path, source: &str) -> String {
        match self.try_transform(path, source) {
            Ok(Some(out)) => out.code,
            Ok(None) => source.to_string(),
            Err(e) => {
                warn!("Leaving {} untouched: {:#}", path.display(), e);
                source.to_string()
            }
        }
    }

    /// `Ok(None)` when the module is out of scope or nothing was stamped.
    pub fn try_transform(&self, path: &Path, source: &str) -> Result<Option<Transformed>> {
        if is_dependency_path(path) || !has_source_extension(path) {
            return Ok(None);
        }
        if !may_contain_calls(source) {
            return Ok(None);
        }

        let file = relative_display(&self.project_root, path);
        if self.config.debug {
            info!("Processing {}", file);
        }

        let tree = parse_module(source, &file).with_context(|| format!("Failed to parse {file}"))?;
        let side = classify(source, Path::new(&file)).side();
        let stamps = plan_stamps(&tree, source, |line| boundary_literal(&file, line, side));
        if stamps.is_empty() {
            debug!("No stampable calls in {}", file);
            return Ok(None);
        }

        let stamped_lines: Vec<u32> = stamps.iter().map(|s| s.line).collect();
        let code = apply_edits(source, stamps.into_iter().flat_map(|s| s.edits).collect());

        // A rewrite that no longer parses is worse than no rewrite.
        parse_module(&code, &file).with_context(|| format!("Rewrite of {file} does not parse"))?;

        if self.config.debug {
            info!("Transformed {} ({} calls)", file, stamped_lines.len());
        }
        Ok(Some(Transformed {
            code,
            stamped_lines,
        }))
    }
}

/// `{ file: "...", line: N, side: "..." }` as a JS object literal.
fn boundary_literal(file: &str, line: u32, side: Side) -> String {
    // JSON string syntax is valid JS string syntax.
    let file = serde_json::Value::from(file).to_string();
    format!("{{ file: {file}, line: {line}, side: \"{side}\" }}")
}
