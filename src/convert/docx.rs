//! DOCX to PDF conversion through an office suite.
//!
//! DOCX rendering is delegated to LibreOffice running headless. The suite is
//! checked once at startup; if it cannot be found or does not start, DOCX
//! conversion stays disabled for the life of the process and every call
//! fails fast with [`Error::AutomationUnavailable`].
//!
//! Each conversion runs inside an [`AutomationSession`] with a private user
//! profile. The session tries the [`SaveStrategy`] list in order and is torn
//! down on every exit path, including panics.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tracing::{debug, error, info, warn};

use crate::config::OfficeConfig;
use crate::error::{Error, Result};

/// Converts DOCX documents to PDF.
///
/// The pipeline receives this as an explicit capability so tests can swap
/// in a fake.
pub trait DocxConverter: Send + Sync {
    /// Whether conversions can be attempted at all
    fn is_available(&self) -> bool;

    /// Convert `input` into a PDF at `output`, returning the output path
    fn convert_docx(&self, input: &Path, output: &Path) -> Result<PathBuf>;
}

/// Ways of asking the office suite to save a document as PDF, richest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStrategy {
    /// Writer PDF export filter with explicit filter options
    WriterExportWithOptions,
    /// Writer PDF export filter selected by name
    WriterExport,
    /// Let the suite pick a filter for the `pdf` target
    GenericPdf,
    /// Generic `pdf` target with the Word 2007 import filter forced, for
    /// documents the suite fails to detect
    ForcedImportFilter,
}

impl SaveStrategy {
    /// Order in which strategies are attempted
    pub const ORDER: [SaveStrategy; 4] = [
        SaveStrategy::WriterExportWithOptions,
        SaveStrategy::WriterExport,
        SaveStrategy::GenericPdf,
        SaveStrategy::ForcedImportFilter,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SaveStrategy::WriterExportWithOptions => "writer_pdf_Export with options",
            SaveStrategy::WriterExport => "writer_pdf_Export",
            SaveStrategy::GenericPdf => "pdf",
            SaveStrategy::ForcedImportFilter => "pdf with forced import filter",
        }
    }

    /// Command line arguments selecting this strategy
    pub fn args(&self) -> Vec<&'static str> {
        match self {
            SaveStrategy::WriterExportWithOptions => vec![
                "--convert-to",
                r#"pdf:writer_pdf_Export:{"SelectPdfVersion":{"type":"long","value":"0"},"ExportBookmarks":{"type":"boolean","value":"true"}}"#,
            ],
            SaveStrategy::WriterExport => vec!["--convert-to", "pdf:writer_pdf_Export"],
            SaveStrategy::GenericPdf => vec!["--convert-to", "pdf"],
            SaveStrategy::ForcedImportFilter => {
                vec!["--infilter=MS Word 2007 XML", "--convert-to", "pdf"]
            }
        }
    }
}

/// Try `strategies` in order until one succeeds.
///
/// Returns the first success together with the strategy that produced it,
/// or the error from the last attempt.
pub fn first_success<S: Copy, T>(
    strategies: &[S],
    mut attempt: impl FnMut(S) -> Result<T>,
) -> Result<(S, T)> {
    let mut last_error = Error::General("no save strategy was attempted".to_string());
    for &strategy in strategies {
        match attempt(strategy) {
            Ok(value) => return Ok((strategy, value)),
            Err(err) => last_error = err,
        }
    }
    Err(last_error)
}

/// Whether the office suite can be used in this process
#[derive(Debug, Clone, PartialEq, Eq)]
enum Availability {
    Ready { soffice: PathBuf },
    Unavailable { reason: String },
}

/// Process-wide handle to the office suite
#[derive(Debug, Clone)]
pub struct OfficeAutomation {
    availability: Availability,
    timeout: Duration,
}

impl OfficeAutomation {
    /// Locate and start-test the office suite.
    ///
    /// Never fails: a missing or broken installation yields a disabled
    /// handle whose conversions all return `AutomationUnavailable`.
    pub fn detect(config: &OfficeConfig) -> Self {
        if config.disabled {
            return Self::disabled("DOCX conversion disabled by configuration", config);
        }

        let soffice = match find_soffice(config) {
            Some(path) => path,
            None => {
                warn!("LibreOffice not found; DOCX conversion will be disabled");
                return Self::disabled(
                    "LibreOffice not found. Install LibreOffice and ensure 'soffice' is in PATH",
                    config,
                );
            }
        };

        match query_version(&soffice, config.conversion_timeout) {
            Ok(version) => {
                info!("Office suite initialized: {} ({})", soffice.display(), version);
                Self {
                    availability: Availability::Ready { soffice },
                    timeout: config.conversion_timeout,
                }
            }
            Err(reason) => {
                warn!("Office suite at {} failed to start: {}", soffice.display(), reason);
                Self::disabled(&format!("failed to start {}: {}", soffice.display(), reason), config)
            }
        }
    }

    fn disabled(reason: &str, config: &OfficeConfig) -> Self {
        Self {
            availability: Availability::Unavailable {
                reason: reason.to_string(),
            },
            timeout: config.conversion_timeout,
        }
    }

    /// Why DOCX conversion is disabled, if it is
    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.availability {
            Availability::Ready { .. } => None,
            Availability::Unavailable { reason } => Some(reason),
        }
    }
}

impl DocxConverter for OfficeAutomation {
    fn is_available(&self) -> bool {
        matches!(self.availability, Availability::Ready { .. })
    }

    fn convert_docx(&self, input: &Path, output: &Path) -> Result<PathBuf> {
        let soffice = match &self.availability {
            Availability::Ready { soffice } => soffice,
            Availability::Unavailable { reason } => {
                return Err(Error::AutomationUnavailable(reason.clone()));
            }
        };

        let start = Instant::now();
        let input = crate::input::absolute(input);

        let mut session = AutomationSession::open(soffice, self.timeout)
            .map_err(|e| Error::conversion(&input, e))?;

        let result = first_success(&SaveStrategy::ORDER, |strategy| {
            session.save_as_pdf(&input, strategy).map_err(|err| {
                debug!("Save strategy '{}' failed for {}: {}", strategy.name(), input.display(), err);
                err
            })
        });
        session.close();

        let (strategy, produced) = result.map_err(|e| {
            error!("Error converting {}: {}", input.display(), e);
            Error::conversion(&input, e)
        })?;

        move_file(&produced, output).map_err(|e| Error::conversion(&input, e))?;

        info!(
            "Converted {} to {} using {} in {:.2}s",
            input.display(),
            output.display(),
            strategy.name(),
            start.elapsed().as_secs_f64()
        );
        Ok(output.to_path_buf())
    }
}

/// One live office-suite instance working on one document.
///
/// Owns a private profile directory; dropping the session kills any process
/// still running and removes the profile.
pub struct AutomationSession {
    soffice: PathBuf,
    profile: TempDir,
    timeout: Duration,
    child: Option<Child>,
    attempts: usize,
}

impl AutomationSession {
    fn open(soffice: &Path, timeout: Duration) -> Result<Self> {
        let profile = TempDir::with_prefix("file-merger-office-")?;
        debug!("Opened office session with profile at {}", profile.path().display());
        Ok(Self {
            soffice: soffice.to_path_buf(),
            profile,
            timeout,
            child: None,
            attempts: 0,
        })
    }

    /// Run one save strategy and return the produced PDF
    fn save_as_pdf(&mut self, input: &Path, strategy: SaveStrategy) -> Result<PathBuf> {
        self.attempts += 1;
        let out_dir = self.profile.path().join(format!("out-{}", self.attempts));
        fs::create_dir_all(&out_dir)?;

        let mut cmd = Command::new(&self.soffice);
        cmd.args([
            "--headless",
            "--invisible",
            "--nologo",
            "--nofirststartwizard",
            "--norestore",
        ]);
        cmd.arg(format!(
            "-env:UserInstallation={}",
            file_url(&self.profile.path().join("user"))
        ));
        cmd.args(strategy.args());
        cmd.arg("--outdir").arg(&out_dir).arg(input);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let child = self.child.insert(cmd.spawn()?);
        let finished = wait_with_timeout(child, self.timeout);
        self.child = None;

        let finished = finished?;
        if !finished.success {
            return Err(Error::General(format!(
                "office suite exited with failure: {}",
                finished.stderr.trim()
            )));
        }

        find_pdf(&out_dir, input)
            .ok_or_else(|| Error::General("PDF output file not found".to_string()))
    }

    fn terminate(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!("Office process already exited: {}", e);
            }
            let _ = child.wait();
        }
    }

    /// Close the document and shut the instance down
    pub fn close(&mut self) {
        self.terminate();
        debug!(
            "Closed office session after {} save attempt(s)",
            self.attempts
        );
    }
}

impl Drop for AutomationSession {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Find the soffice binary: explicit path, well-known locations, then PATH
fn find_soffice(config: &OfficeConfig) -> Option<PathBuf> {
    if let Some(ref path) = config.soffice_path {
        return path.exists().then(|| path.clone());
    }

    let candidates = [
        // Windows
        r"C:\Program Files\LibreOffice\program\soffice.exe",
        r"C:\Program Files (x86)\LibreOffice\program\soffice.exe",
        // macOS
        "/Applications/LibreOffice.app/Contents/MacOS/soffice",
        // Linux
        "/usr/bin/soffice",
        "/usr/lib/libreoffice/program/soffice",
        "/opt/libreoffice/program/soffice",
        "/snap/bin/libreoffice.soffice",
    ];

    candidates
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
        .or_else(|| {
            which::which("soffice")
                .or_else(|_| which::which("libreoffice"))
                .ok()
        })
}

/// Start the suite once to make sure it actually runs
fn query_version(soffice: &Path, timeout: Duration) -> std::result::Result<String, String> {
    let mut child = Command::new(soffice)
        .args(["--headless", "--version"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| e.to_string())?;

    let finished = wait_with_timeout(&mut child, timeout).map_err(|e| e.to_string())?;
    if finished.success {
        Ok(finished.stdout.trim().to_string())
    } else {
        Err(finished.stderr.trim().to_string())
    }
}

/// Exit status and captured output of a child that ran to completion
struct Finished {
    success: bool,
    stdout: String,
    stderr: String,
}

/// Wait for `child`, killing it once `timeout` has passed.
///
/// Piped stdout and stderr are drained on helper threads while waiting, so a
/// chatty child cannot fill a pipe and stall.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<Finished> {
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let deadline = Instant::now() + timeout;

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Finished {
                success: status.success(),
                stdout: collect(stdout),
                stderr: collect(stderr),
            });
        }

        if Instant::now() >= deadline {
            if let Err(e) = child.kill() {
                debug!("Office process already exited: {}", e);
            }
            let _ = child.wait();
            // Readers are detached: a grandchild may still hold the pipes
            return Err(Error::General(format!(
                "office suite timed out after {} seconds",
                timeout.as_secs()
            )));
        }
        thread::sleep(Duration::from_millis(50));
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut bytes = Vec::new();
            let _ = pipe.read_to_end(&mut bytes);
            String::from_utf8_lossy(&bytes).into_owned()
        })
    })
}

fn collect(reader: Option<JoinHandle<String>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

/// `file://` URL for `path`, as `-env:UserInstallation` expects
fn file_url(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/").replace(' ', "%20");
    if raw.starts_with('/') {
        format!("file://{}", raw)
    } else {
        format!("file:///{}", raw)
    }
}

/// Locate the PDF the suite wrote for `input` inside `out_dir`
fn find_pdf(out_dir: &Path, input: &Path) -> Option<PathBuf> {
    let stem = input.file_stem()?.to_string_lossy().into_owned();
    let expected = out_dir.join(format!("{}.pdf", stem));
    if is_non_empty(&expected) {
        return Some(expected);
    }

    // The suite may have normalized the file name
    fs::read_dir(out_dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false)
                && is_non_empty(path)
        })
}

fn is_non_empty(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}

/// Rename, falling back to copy + delete across filesystems
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        let _ = fs::remove_file(from);
    }
    Ok(())
}
