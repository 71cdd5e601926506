//! The sift analyzer CLI.
//!
//! Subcommands:
//!
//! - `siftc analyze <root>` - analyze a source tree and report findings
//! - `siftc html <root> <outdir>` - analyze and emit cross-referenced HTML
//!
//! Options:
//! - `--cache-dir` - directory for the serialized AST cache
//! - `--quiet` - only warnings and the final summary
//! - `--debug` - verbose logging, integer bounds in type output
//! - `--json` - diagnostics as JSON (one object per line)
//! - `--no-color` - disable colorized diagnostics
//!
//! The exit code is 0 on completion even when individual files fail to
//! parse; only argument and IO errors are fatal.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use sift_analysis::diagnostics::render_diagnostic;
use sift_analysis::{Analyzer, AnalyzerOptions, DiagnosticOptions};

/// Stack for the analysis thread; the transform pass is recursive over
/// deep trees and call chains.
const ANALYSIS_STACK_SIZE: usize = 256 * 1024 * 1024;

#[derive(Parser)]
#[command(
    name = "siftc",
    version,
    about = "Whole-program type inference and cross-referencing for scripting languages"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a file or directory tree and report findings
    Analyze {
        /// Root path (a directory or a single source file)
        root: PathBuf,

        /// Directory for the serialized AST cache
        #[arg(long = "cache-dir")]
        cache_dir: Option<PathBuf>,

        /// Only warnings and the final summary
        #[arg(long)]
        quiet: bool,

        /// Verbose logging and integer bounds in reported types
        #[arg(long)]
        debug: bool,

        /// Output diagnostics as JSON (one object per line)
        #[arg(long)]
        json: bool,

        /// Disable colorized output
        #[arg(long = "no-color")]
        no_color: bool,
    },
    /// Analyze and emit cross-referenced HTML
    Html {
        /// Root path (a directory or a single source file)
        root: PathBuf,

        /// Output directory for the generated pages
        outdir: PathBuf,

        /// Directory for the serialized AST cache
        #[arg(long = "cache-dir")]
        cache_dir: Option<PathBuf>,

        /// Only warnings and the final summary
        #[arg(long)]
        quiet: bool,

        /// Verbose logging
        #[arg(long)]
        debug: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze {
            root,
            cache_dir,
            quiet,
            debug,
            json,
            no_color,
        } => {
            init_logging(quiet, debug);
            let diag_opts = DiagnosticOptions {
                color: !no_color && !json,
                json,
            };
            let options = AnalyzerOptions {
                cache_dir,
                quiet,
                debug,
            };
            match run_analysis(root, options, diag_opts, None) {
                Ok(report) => report.print(),
                Err(e) => {
                    eprintln!("error: {e}");
                    process::exit(1);
                }
            }
        }
        Commands::Html {
            root,
            outdir,
            cache_dir,
            quiet,
            debug,
        } => {
            init_logging(quiet, debug);
            let diag_opts = DiagnosticOptions {
                color: true,
                json: false,
            };
            let options = AnalyzerOptions {
                cache_dir,
                quiet,
                debug,
            };
            match run_analysis(root, options, diag_opts, Some(outdir)) {
                Ok(report) => report.print(),
                Err(e) => {
                    eprintln!("error: {e}");
                    process::exit(1);
                }
            }
        }
    }
}

fn init_logging(quiet: bool, debug: bool) {
    let default = if debug {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// What the analysis thread hands back for reporting.
struct Report {
    files: usize,
    bindings: usize,
    references: usize,
    rendered: Vec<String>,
    problem_count: usize,
    pages: Option<usize>,
}

impl Report {
    fn print(&self) {
        for diag in &self.rendered {
            eprint!("{diag}");
            if !diag.ends_with('\n') {
                eprintln!();
            }
        }
        eprintln!(
            "  Analyzed {} file(s): {} bindings, {} references, {} problem(s)",
            self.files, self.bindings, self.references, self.problem_count
        );
        if let Some(pages) = self.pages {
            eprintln!("  Wrote {pages} HTML page(s)");
        }
    }
}

/// Run the whole analysis on a dedicated thread with a generous stack and
/// return an owned, thread-safe report.
fn run_analysis(
    root: PathBuf,
    options: AnalyzerOptions,
    diag_opts: DiagnosticOptions,
    html_out: Option<PathBuf>,
) -> Result<Report, String> {
    if !root.exists() {
        return Err(format!("path '{}' does not exist", root.display()));
    }
    let handle = std::thread::Builder::new()
        .name("analysis".to_string())
        .stack_size(ANALYSIS_STACK_SIZE)
        .spawn(move || -> Result<Report, String> {
            let mut az = Analyzer::new(options);
            az.analyze(&root)
                .map_err(|e| format!("failed to read '{}': {e}", root.display()))?;
            az.finish();

            let rendered = render_problems(&az, &diag_opts);
            let pages = match html_out {
                Some(out) => Some(
                    sift_html::generate(&az, &root, &out)
                        .map_err(|e| format!("failed to write '{}': {e}", out.display()))?,
                ),
                None => None,
            };
            Ok(Report {
                files: az
                    .loaded_files()
                    .iter()
                    .filter(|f| Path::new(&f.path).exists())
                    .count(),
                bindings: az.get_all_bindings().len(),
                references: az.get_references().len(),
                problem_count: az.all_problems().len(),
                rendered,
                pages,
            })
        })
        .map_err(|e| format!("failed to spawn analysis thread: {e}"))?;
    handle
        .join()
        .map_err(|_| "analysis thread panicked".to_string())?
}

/// Render every diagnostic against its source, reading each file once.
fn render_problems(az: &Analyzer, options: &DiagnosticOptions) -> Vec<String> {
    let mut sources: HashMap<String, String> = HashMap::new();
    let mut out = Vec::new();
    for diag in az.all_problems() {
        let source = sources
            .entry(diag.file.clone())
            .or_insert_with(|| std::fs::read_to_string(&diag.file).unwrap_or_default());
        out.push(render_diagnostic(diag, source, options));
    }
    out
}
