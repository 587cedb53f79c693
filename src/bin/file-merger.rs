//! File Merger CLI tool
//!
//! Merges PDF, DOCX, TXT, JPG and PNG files into one PDF, either from an
//! interactive shell or in one shot from the command line.

use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use file_merger::config::{OfficeConfig, PipelineSettings, SCRATCH_DIR_NAME};
use file_merger::convert::OfficeAutomation;
use file_merger::input::PageSelection;
use file_merger::pdf::extract_metadata;
use file_merger::pipeline::{MergeEvents, MergeJob, MergePipeline};
use file_merger::shell::progress::{render_bar, ProgressThrottle};
use file_merger::shell::{with_pdf_extension, Shell};
use file_merger::{parse_page_ranges, Error};

/// File Merger - Combine documents and images into a single PDF
#[derive(Parser)]
#[command(name = "file-merger")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Start the interactive shell
    file-merger

    # Merge a cover letter, a scan and some notes
    file-merger merge -o packet.pdf cover.docx scan.png notes.txt

    # Take pages 3, 1 and 1 again from report.pdf
    file-merger merge -o out.pdf --pages report.pdf=3,1,1 report.pdf appendix.pdf

    # Merge numbered PDFs in order and open the result
    file-merger merge -o handout.pdf --open \"[0-9]*.pdf\"")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory for intermediate PDFs
    #[arg(long, global = true, env = "FILE_MERGER_SCRATCH_DIR", default_value = SCRATCH_DIR_NAME)]
    scratch_dir: PathBuf,

    /// Path to the LibreOffice `soffice` binary used for DOCX conversion
    #[arg(long, global = true, env = "FILE_MERGER_SOFFICE")]
    soffice: Option<PathBuf>,

    /// Disable DOCX conversion
    #[arg(long, global = true)]
    no_docx: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive shell (default)
    Shell,

    /// Merge files into one PDF
    Merge {
        /// Input files (in order). Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Page selection for a PDF or DOCX input, as FILE=RANGES (e.g. report.pdf=1,3-5)
        #[arg(long = "pages", value_name = "FILE=RANGES")]
        pages: Vec<String>,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = PipelineSettings::default().with_scratch_dir(&cli.scratch_dir);
    let office = OfficeConfig {
        soffice_path: cli.soffice.clone(),
        disabled: cli.no_docx,
        ..OfficeConfig::default()
    };

    let result = match cli.command {
        None | Some(Commands::Shell) => cmd_shell(settings, &office),
        Some(Commands::Merge {
            inputs,
            output,
            pages,
            open,
        }) => cmd_merge(settings, &office, inputs, output, pages, open),
        Some(Commands::Info { input }) => cmd_info(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn build_pipeline(settings: PipelineSettings, office: &OfficeConfig) -> MergePipeline {
    let automation = OfficeAutomation::detect(office);
    if let Some(reason) = automation.unavailable_reason() {
        warn!("DOCX conversion disabled: {}", reason);
    }
    MergePipeline::new(Arc::new(automation), settings)
}

/// Run the interactive shell on stdin/stdout
fn cmd_shell(settings: PipelineSettings, office: &OfficeConfig) -> Result<()> {
    let pipeline = build_pipeline(settings, office);
    let stdin = io::stdin();
    let stdout = io::stdout();

    Shell::new(pipeline, stdin.lock(), stdout.lock())
        .run()
        .context("shell I/O failed")
}

/// Prints throttled progress and per-file problems to stderr
struct ConsoleEvents {
    throttle: ProgressThrottle,
}

impl MergeEvents for ConsoleEvents {
    fn progress(&mut self, percent: f64) {
        if let Some(band) = self.throttle.update(percent) {
            eprintln!("{}", render_bar(band));
        }
    }

    fn file_failed(&mut self, error: &Error) {
        eprintln!("Error: {}", error);
    }

    fn notice(&mut self, message: &str) {
        eprintln!("Note: {}", message);
    }
}

/// Merge files into one PDF without the shell
fn cmd_merge(
    settings: PipelineSettings,
    office: &OfficeConfig,
    inputs: Vec<String>,
    output: PathBuf,
    pages: Vec<String>,
    open: bool,
) -> Result<()> {
    let inputs = expand_globs(inputs)?;
    let selection = parse_selections(&pages)?;
    let output = with_pdf_extension(output);

    let pipeline = build_pipeline(settings, office);
    let job = MergeJob::new(inputs, &output).with_selection(selection);

    eprintln!("Merging {} files...", job.inputs.len());

    let mut events = ConsoleEvents {
        throttle: ProgressThrottle::new(),
    };
    let report = pipeline.run(&job, &mut events)?;

    eprintln!(
        "Merged {} of {} files ({} pages) to: {}",
        report.files_merged,
        job.inputs.len(),
        report.pages,
        output.display()
    );

    if open {
        open_file(&output)?;
    }

    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: &Path) -> Result<()> {
    let metadata = extract_metadata(input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    println!("File: {}", input.display());
    println!("Version: {}", metadata.version);
    println!("Pages: {}", metadata.page_count);

    if let Some(declared) = metadata.declared_count.filter(|n| *n != metadata.page_count) {
        println!("Declared pages: {}", declared);
    }
    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }

    Ok(())
}

/// Parse repeated `FILE=RANGES` arguments into a page selection
fn parse_selections(values: &[String]) -> Result<PageSelection> {
    let mut selection = PageSelection::new();

    for value in values {
        let Some((file, ranges)) = value.rsplit_once('=') else {
            bail!("invalid --pages value '{}': expected FILE=RANGES", value);
        };
        let path = PathBuf::from(file);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.to_string());
        let parsed = parse_page_ranges(ranges, &name)?;
        selection.set(&path, parsed);
    }

    Ok(selection)
}

/// Expand glob patterns in input paths.
///
/// Matches of one pattern are sorted; the order of patterns is kept.
fn expand_globs(patterns: Vec<String>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        // Check if pattern contains glob characters
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched = false;
            for entry in glob(&pattern).with_context(|| format!("bad glob pattern: {}", pattern))? {
                match entry {
                    Ok(path) => {
                        paths.push(path);
                        matched = true;
                    }
                    Err(e) => warn!("glob error for {}: {}", pattern, e),
                }
            }
            if !matched {
                bail!("No files matched pattern: {}", pattern);
            }
        } else {
            // No glob characters, treat as literal path
            paths.push(PathBuf::from(pattern));
        }
    }

    info!("Expanded inputs: {:?}", paths);
    Ok(paths)
}

/// Open a file with the system default application
fn open_file(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(path).spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(path).spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    Ok(())
}
