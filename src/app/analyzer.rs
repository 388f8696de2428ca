use crate::adapters::fs::reader::FileSourceReader;
use crate::adapters::fs::walker::{SourceWalker, classification_path, relative_display};
use crate::adapters::typescript::TypeScriptExtractor;
use crate::domain::boundary::{BoundaryLabel, classify};
use crate::domain::call::{AnalysisResult, CallSite, RecordedCall};
use crate::domain::detector::{CommunicationType, extract_procedure};
use crate::domain::ports::{CallSiteExtractor, ModuleSource, SourceReader};
use anyhow::{Context as _, Result};
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Offline project scanner producing every remote call with its boundary.
pub struct Analyzer {
    modules: Box<dyn ModuleSource>,
    reader: Box<dyn SourceReader>,
    extractor: Box<dyn CallSiteExtractor>,
}

impl Analyzer {
    pub fn new(
        modules: Box<dyn ModuleSource>,
        reader: Box<dyn SourceReader>,
        extractor: Box<dyn CallSiteExtractor>,
    ) -> Self {
        Self {
            modules,
            reader,
            extractor,
        }
    }

    /// Analyzer over the file system and the tree-sitter TypeScript grammar.
    pub fn for_project(ignore_patterns: &[String]) -> Result<Self> {
        let walker = SourceWalker::new(ignore_patterns)?;
        Ok(Self::new(
            Box::new(walker),
            Box::new(FileSourceReader::new()),
            Box::new(TypeScriptExtractor::new()),
        ))
    }

    /// Scan `root`. Fails only when the root itself cannot be traversed;
    /// unreadable or unparsable modules are skipped with a warning.
    pub fn analyze(&self, root: &Path) -> Result<AnalysisResult> {
        let modules = self
            .modules
            .modules(root)
            .with_context(|| format!("Failed to scan {}", root.display()))?;
        info!("Analyzing {} modules under {}", modules.len(), root.display());

        // Indexed parallel collect keeps traversal order.
        let per_module: Vec<Vec<RecordedCall>> = modules
            .par_iter()
            .map(|path| {
                let file = relative_display(root, path);
                match self.analyze_module(path, &file) {
                    Ok(calls) => calls,
                    Err(e) => {
                        warn!("Skipping {}: {:#}", file, e);
                        Vec::new()
                    }
                }
            })
            .collect();

        let calls: Vec<RecordedCall> = per_module.into_iter().flatten().collect();
        debug!("Recorded {} calls", calls.len());
        Ok(AnalysisResult {
            calls,
            file_count: modules.len(),
        })
    }

    fn analyze_module(&self, path: &Path, file: &str) -> Result<Vec<RecordedCall>> {
        let source = self.reader.read(path)?;
        let boundary = classify(&source, &classification_path(path));
        let sites = self.extractor.call_sites(&source, file)?;
        Ok(sites
            .iter()
            .filter_map(|site| record_call(site, boundary))
            .collect())
    }
}

/// Turn a call site into a recorded call if its chain is rooted at the client.
pub fn record_call(site: &CallSite, boundary: BoundaryLabel) -> Option<RecordedCall> {
    let procedure = extract_procedure(&site.callee_chain)?;
    Some(RecordedCall {
        communication_type: CommunicationType::from_method(&procedure.method),
        procedure_path: procedure.procedure_path,
        method: procedure.method,
        file: site.file.clone(),
        line: site.line,
        boundary,
    })
}
