//! Aggregation and rendering of analysis results: a console view for humans
//! and a markdown report for pull requests.

use crate::domain::boundary::BoundaryLabel;
use crate::domain::call::{AnalysisResult, RecordedCall};
use crate::domain::detector::{CommunicationType, ROOT_PROCEDURE};
use colored::{ColoredString, Colorize};
use std::fmt::Write as _;

/// Hotspots shown on the console unless `show_all` or `details` is set.
pub const CONSOLE_HOTSPOTS: usize = 5;

/// Rows of the markdown file ranking.
pub const MARKDOWN_TOP_FILES: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    pub show_all: bool,
    pub details: bool,
    pub collapse: bool,
}

/// Calls per boundary label, in order of first occurrence.
pub fn boundary_summary(calls: &[RecordedCall]) -> Vec<(BoundaryLabel, usize)> {
    let mut summary: Vec<(BoundaryLabel, usize)> = Vec::new();
    for call in calls {
        match summary.iter_mut().find(|(label, _)| *label == call.boundary) {
            Some((_, count)) => *count += 1,
            None => summary.push((call.boundary, 1)),
        }
    }
    summary
}

pub fn count_for(summary: &[(BoundaryLabel, usize)], label: BoundaryLabel) -> usize {
    summary
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, n)| *n)
        .unwrap_or(0)
}

/// All calls recorded for one module.
#[derive(Debug, Clone)]
pub struct FileCalls<'a> {
    pub file: &'a str,
    pub boundary: BoundaryLabel,
    pub calls: Vec<&'a RecordedCall>,
}

impl FileCalls<'_> {
    pub fn count(&self) -> usize {
        self.calls.len()
    }

    /// Calls ascending by line; equal lines keep encounter order.
    pub fn by_line(&self) -> Vec<&RecordedCall> {
        let mut calls = self.calls.clone();
        calls.sort_by_key(|c| c.line);
        calls
    }
}

/// Files by call count, descending. Ties keep first-encounter order.
pub fn file_ranking(calls: &[RecordedCall]) -> Vec<FileCalls<'_>> {
    let mut files: Vec<FileCalls<'_>> = Vec::new();
    for call in calls {
        match files.iter_mut().find(|f| f.file == call.file) {
            Some(f) => f.calls.push(call),
            None => files.push(FileCalls {
                file: &call.file,
                boundary: call.boundary,
                calls: vec![call],
            }),
        }
    }
    // sort_by is stable
    files.sort_by(|a, b| b.count().cmp(&a.count()));
    files
}

/// Repeated invocations of one procedure method within a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsedCall<'a> {
    pub procedure_path: &'a str,
    pub method: &'a str,
    pub communication_type: CommunicationType,
    pub count: usize,
}

/// Group by `(procedure_path, method)` in order of first occurrence.
pub fn collapse_calls<'a>(calls: &[&'a RecordedCall]) -> Vec<CollapsedCall<'a>> {
    let mut groups: Vec<CollapsedCall<'a>> = Vec::new();
    for call in calls {
        match groups
            .iter_mut()
            .find(|g| g.procedure_path == call.procedure_path && g.method == call.method)
        {
            Some(g) => g.count += 1,
            None => groups.push(CollapsedCall {
                procedure_path: &call.procedure_path,
                method: &call.method,
                communication_type: call.communication_type,
                count: 1,
            }),
        }
    }
    groups
}

/// Client expression the call was written as, e.g. `trpc.user.get.useQuery`.
pub fn call_expression(procedure_path: &str, method: &str) -> String {
    if procedure_path == ROOT_PROCEDURE {
        format!("trpc.{method}")
    } else {
        format!("trpc.{procedure_path}.{method}")
    }
}

/// Renders the console view. Colors are applied only when enabled.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleReporter {
    color: bool,
}

impl ConsoleReporter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_file(&self, file: &str, boundary: BoundaryLabel) -> String {
        match boundary {
            BoundaryLabel::Client => self.paint(file, |s| s.yellow()),
            BoundaryLabel::ServerRsc => self.paint(file, |s| s.green()),
            BoundaryLabel::Edge => self.paint(file, |s| s.magenta()),
            BoundaryLabel::Unknown => self.paint(file, |s| s.white()),
        }
    }

    fn type_label(&self, kind: CommunicationType) -> String {
        let label = format!("[{kind}]");
        match kind {
            CommunicationType::Query => self.paint(&label, |s| s.green()),
            CommunicationType::Mutation => self.paint(&label, |s| s.red()),
            CommunicationType::Subscription => self.paint(&label, |s| s.magenta()),
            CommunicationType::Utils => self.paint(&label, |s| s.yellow()),
            CommunicationType::Unknown => self.paint(&label, |s| s.dimmed()),
        }
    }

    fn expression(&self, procedure_path: &str, method: &str) -> String {
        let text = call_expression(procedure_path, method);
        // React hooks vs. vanilla client calls
        if method.starts_with("use") {
            self.paint(&text, |s| s.cyan())
        } else {
            self.paint(&text, |s| s.blue())
        }
    }

    pub fn render(&self, result: &AnalysisResult, opts: ReportOptions) -> String {
        let mut out = String::new();
        let title = "tRPC Network Boundary Inspection";
        let _ = writeln!(out, "\n{}", self.paint(title, |s| s.bold()));
        let _ = writeln!(out, "{}", "=".repeat(title.len()));
        let _ = writeln!(
            out,
            "Total network boundary crossings: {}",
            self.paint(&result.calls.len().to_string(), |s| s.bold())
        );

        // Only boundaries that actually occur get a row.
        let summary = boundary_summary(&result.calls);
        let rows = [
            ("Crossings from Browser (Client): ", BoundaryLabel::Client),
            ("Crossings from Server (RSC):     ", BoundaryLabel::ServerRsc),
            ("Crossings from Edge Runtime:     ", BoundaryLabel::Edge),
            ("Crossings from unclassified code: ", BoundaryLabel::Unknown),
        ];
        for (label, boundary) in rows {
            let count = count_for(&summary, boundary);
            if count > 0 {
                let _ = writeln!(out, "{label}{count}");
            }
        }

        let ranking = file_ranking(&result.calls);
        if ranking.is_empty() {
            return out;
        }

        let everything = opts.show_all || opts.details;
        let heading = if everything { "All hotspots:" } else { "Top hotspots:" };
        let _ = writeln!(out, "\n{}", self.paint(heading, |s| s.bold()));
        let shown = if everything {
            ranking.len()
        } else {
            ranking.len().min(CONSOLE_HOTSPOTS)
        };

        for group in &ranking[..shown] {
            let _ = writeln!(
                out,
                "  {:>4} {}  {}",
                group.count(),
                self.paint_file(group.file, group.boundary),
                self.paint(&format!("[{}]", group.boundary), |s| s.dimmed())
            );
            if opts.collapse {
                for c in collapse_calls(&group.by_line()) {
                    let times = if c.count > 1 {
                        format!(" (x{})", c.count)
                    } else {
                        String::new()
                    };
                    let _ = writeln!(
                        out,
                        "         {} {}{}",
                        self.type_label(c.communication_type),
                        self.expression(c.procedure_path, c.method),
                        times
                    );
                }
            } else if opts.details {
                for call in group.by_line() {
                    let _ = writeln!(
                        out,
                        "         {:<5} {} {}",
                        format!("L{}", call.line),
                        self.type_label(call.communication_type),
                        self.expression(&call.procedure_path, &call.method)
                    );
                }
            }
        }

        if shown < ranking.len() {
            let _ = writeln!(
                out,
                "  ... and {} more files (use --all to list them)",
                ranking.len() - shown
            );
        }
        out
    }

    pub fn print(&self, result: &AnalysisResult, opts: ReportOptions) {
        print!("{}", self.render(result, opts));
    }
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Full markdown report: totals, boundary summary, top files, every call.
pub fn markdown_report(result: &AnalysisResult) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# tRPC Boundary Report\n");
    let _ = writeln!(
        md,
        "Analyzed **{}** files. Found **{}** network boundary crossings.\n",
        result.file_count,
        result.calls.len()
    );

    let _ = writeln!(md, "## Summary by Boundary\n");
    let _ = writeln!(md, "| Boundary | Calls |");
    let _ = writeln!(md, "| --- | --- |");
    for (label, count) in boundary_summary(&result.calls) {
        let _ = writeln!(md, "| {} | {} |", cell(label.as_str()), count);
    }

    let _ = writeln!(md, "\n## Top Files by tRPC Calls\n");
    let _ = writeln!(md, "| File | Boundary | Calls |");
    let _ = writeln!(md, "| --- | --- | --- |");
    for group in file_ranking(&result.calls).iter().take(MARKDOWN_TOP_FILES) {
        let _ = writeln!(
            md,
            "| {} | {} | {} |",
            cell(group.file),
            cell(group.boundary.as_str()),
            group.count()
        );
    }

    let _ = writeln!(md, "\n## Detailed Call List\n");
    let _ = writeln!(md, "| Procedure | Method | Boundary | File:Line |");
    let _ = writeln!(md, "| --- | --- | --- | --- |");
    for call in &result.calls {
        let _ = writeln!(
            md,
            "| {} | {} | {} | {}:{} |",
            cell(&call.procedure_path),
            cell(&call.method),
            cell(call.boundary.as_str()),
            cell(&call.file),
            call.line
        );
    }
    md
}
