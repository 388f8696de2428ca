use crate::app::analyzer::Analyzer;
use crate::app::injector::Injector;
use crate::app::reporter::{ConsoleReporter, ReportOptions, markdown_report};
use crate::config::InjectorConfig;
use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "trpc-boundary")]
#[command(about = "Find where tRPC calls cross the network boundary", long_about = None)]
#[command(version, args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub scan: ScanArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stamp one module with boundary metadata and print the result
    Inject(InjectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Project directory to scan. A directory literally named `inject` is
    /// read as the subcommand; pass it as `./inject`
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Write a markdown report to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// List every file, not just the top hotspots
    #[arg(long)]
    pub all: bool,

    /// Show every call per file with its line number
    #[arg(long)]
    pub details: bool,

    /// Group repeated calls of the same procedure
    #[arg(long)]
    pub collapse: bool,

    /// Directory or file names to skip
    #[arg(short = 'I', long = "ignore", value_name = "PATTERN", num_args = 1..)]
    pub ignore: Vec<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl ScanArgs {
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            show_all: self.all,
            details: self.details,
            collapse: self.collapse,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct InjectArgs {
    /// Module to transform
    pub file: PathBuf,

    /// Project root stamped paths are relative to (defaults to the current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Injector options as JSON, e.g. '{"debug":true}'
    #[arg(long, value_name = "JSON")]
    pub config: Option<String>,
}

/// Analyze a project, print the console report and optionally write markdown.
/// Nothing is written unless the scan succeeds.
pub fn run_scan(args: &ScanArgs) -> Result<()> {
    let root = std::fs::canonicalize(&args.path)
        .with_context(|| format!("Cannot resolve scan path: {}", args.path.display()))?;

    let analyzer = Analyzer::for_project(&args.ignore)?;
    let result = analyzer.analyze(&root)?;

    ConsoleReporter::new(!args.no_color).print(&result, args.report_options());

    if let Some(output) = &args.output {
        std::fs::write(output, markdown_report(&result))
            .with_context(|| format!("Failed to write report: {}", output.display()))?;
        println!("\nReport saved to {}", output.display());
    }
    Ok(())
}

/// Transform a module and write it to stdout. Transform failures print the
/// module unchanged.
pub fn run_inject(args: &InjectArgs) -> Result<()> {
    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read module: {}", args.file.display()))?;
    let root = match &args.root {
        Some(root) => std::path::absolute(root)
            .with_context(|| format!("Cannot resolve project root: {}", root.display()))?,
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };
    let file = std::path::absolute(&args.file)
        .with_context(|| format!("Cannot resolve module path: {}", args.file.display()))?;
    let config = args
        .config
        .as_deref()
        .map(InjectorConfig::from_json)
        .unwrap_or_default();

    let injector = Injector::new(root, config);
    print!("{}", injector.transform(&file, &source));
    Ok(())
}
