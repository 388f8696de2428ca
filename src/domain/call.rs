use crate::domain::boundary::BoundaryLabel;
use crate::domain::detector::CommunicationType;
use serde::{Deserialize, Serialize};

/// A call expression as seen by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// Dotted callee, root first, terminal last.
    pub callee_chain: Vec<String>,
    pub terminal_method: String,
    pub file: String,
    /// 1-based
    pub line: u32,
}

impl CallSite {
    pub fn new(callee_chain: Vec<String>, file: impl Into<String>, line: u32) -> Self {
        let terminal_method = callee_chain.last().cloned().unwrap_or_default();
        Self {
            callee_chain,
            terminal_method,
            file: file.into(),
            line,
        }
    }
}

/// One observed remote call, as emitted by the Analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedCall {
    pub procedure_path: String,
    pub method: String,
    pub communication_type: CommunicationType,
    pub file: String,
    pub line: u32,
    pub boundary: BoundaryLabel,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Module traversal order, then encounter order within a module.
    pub calls: Vec<RecordedCall>,
    pub file_count: usize,
}
