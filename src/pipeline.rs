//! The merge pipeline
//!
//! For each input, in order: convert if needed, extract selected pages if
//! requested, append to the accumulator. Per-file failures are reported and
//! skipped; the job only fails when nothing could be merged or the output
//! cannot be written. Temporary artifacts are purged on every exit path.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, error, info};

use crate::config::PipelineSettings;
use crate::convert::{image_to_pdf, text_to_pdf, DocxConverter};
use crate::error::{Error, Result};
use crate::input::{absolute, display_name, FileKind, PageSelection};
use crate::pdf::{PageExtractor, PdfAccumulator};
use crate::scratch::ScratchSpace;

/// Everything one merge needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeJob {
    /// Input files in output order
    pub inputs: Vec<PathBuf>,
    /// Optional per-file page selections
    pub selection: PageSelection,
    /// Destination PDF
    pub output: PathBuf,
}

impl MergeJob {
    pub fn new(inputs: Vec<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            inputs,
            selection: PageSelection::new(),
            output: output.into(),
        }
    }

    pub fn with_selection(mut self, selection: PageSelection) -> Self {
        self.selection = selection;
        self
    }
}

/// Receives progress and problems while a job runs
pub trait MergeEvents {
    /// Overall progress from 0 to 100, sent after each file
    fn progress(&mut self, _percent: f64) {}

    /// A file was skipped
    fn file_failed(&mut self, _error: &Error) {}

    /// Something the user should know that is not a failure
    fn notice(&mut self, _message: &str) {}
}

/// Ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEvents;

impl MergeEvents for NoEvents {}

/// A file that could not be merged
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: Error,
}

/// Summary of a completed merge
#[derive(Debug)]
pub struct MergeReport {
    pub output: PathBuf,
    /// Files that contributed pages
    pub files_merged: usize,
    /// Pages in the output
    pub pages: usize,
    pub skipped: Vec<SkippedFile>,
    pub notices: Vec<String>,
    /// Temporary files that survived every delete attempt
    pub cleanup_failures: Vec<PathBuf>,
}

impl MergeReport {
    fn new(output: &Path) -> Self {
        Self {
            output: output.to_path_buf(),
            files_merged: 0,
            pages: 0,
            skipped: Vec::new(),
            notices: Vec::new(),
            cleanup_failures: Vec::new(),
        }
    }
}

/// Runs merge jobs against a DOCX capability and settings
#[derive(Clone)]
pub struct MergePipeline {
    converter: Arc<dyn DocxConverter>,
    settings: PipelineSettings,
}

impl MergePipeline {
    pub fn new(converter: Arc<dyn DocxConverter>, settings: PipelineSettings) -> Self {
        Self {
            converter,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn docx_available(&self) -> bool {
        self.converter.is_available()
    }

    /// Run `job` to completion on the current thread
    pub fn run(&self, job: &MergeJob, events: &mut dyn MergeEvents) -> Result<MergeReport> {
        let start = Instant::now();
        debug!("Merging {} files into {}", job.inputs.len(), job.output.display());

        let mut scratch = ScratchSpace::new(&self.settings);
        let result = self.merge_all(job, &mut scratch, events);

        // Runs whether or not the merge succeeded
        let leftovers = scratch.purge();
        for err in &leftovers {
            events.notice(&err.to_string());
        }

        let mut report = result?;
        report.cleanup_failures = leftovers
            .into_iter()
            .filter_map(|err| match err {
                Error::DeleteRetryExhausted { path, .. } => Some(path),
                _ => None,
            })
            .collect();

        info!(
            "Successfully merged into {} in {:.2}s",
            job.output.display(),
            start.elapsed().as_secs_f64()
        );
        Ok(report)
    }

    /// Run `job` on a background thread
    pub fn spawn(&self, job: MergeJob) -> BackgroundJob {
        let (sender, receiver) = mpsc::channel();
        let pipeline = self.clone();

        let handle = thread::spawn(move || {
            let mut events = ChannelEvents { sender };
            pipeline.run(&job, &mut events)
        });

        BackgroundJob {
            events: receiver,
            handle: Some(handle),
        }
    }

    fn merge_all(
        &self,
        job: &MergeJob,
        scratch: &mut ScratchSpace,
        events: &mut dyn MergeEvents,
    ) -> Result<MergeReport> {
        scratch.ensure_dir()?;

        let mut merged = PdfAccumulator::new();
        let mut report = MergeReport::new(&job.output);
        let total = job.inputs.len();

        for (index, file) in job.inputs.iter().enumerate() {
            let file_start = Instant::now();
            match self.merge_file(index, file, job, &mut merged, scratch, &mut report, events) {
                Ok(pages) => {
                    report.files_merged += 1;
                    info!(
                        "Appended {} pages from {} in {:.2}s",
                        pages,
                        file.display(),
                        file_start.elapsed().as_secs_f64()
                    );
                }
                Err(err) => {
                    error!("{}", err);
                    events.file_failed(&err);
                    report.skipped.push(SkippedFile {
                        path: file.clone(),
                        error: err,
                    });
                }
            }

            events.progress((index + 1) as f64 / total as f64 * 100.0);
        }

        if merged.is_empty() {
            error!("No pages merged");
            return Err(Error::NoPagesMerged);
        }

        report.pages = merged.write(&job.output)?;
        Ok(report)
    }

    /// Process one input. Returns the number of pages appended.
    #[allow(clippy::too_many_arguments)]
    fn merge_file(
        &self,
        index: usize,
        file: &Path,
        job: &MergeJob,
        merged: &mut PdfAccumulator,
        scratch: &mut ScratchSpace,
        report: &mut MergeReport,
        events: &mut dyn MergeEvents,
    ) -> Result<usize> {
        if !file.exists() {
            return Err(Error::FileNotFound(file.to_path_buf()));
        }
        let file = absolute(file);
        let kind = FileKind::from_path(&file);
        let pages = job.selection.get(&file);
        debug!("Processing {}: requested pages={:?}", file.display(), pages);

        let source = match (kind, pages) {
            (Some(kind), Some(pages)) if kind.supports_page_selection() => {
                let output = scratch.track(&format!("temp_extract_{}.pdf", index));
                let extraction = PageExtractor::new(self.converter.as_ref())
                    .extract(&file, pages, &output, scratch)?;
                if extraction.fell_back {
                    let message = format!(
                        "No valid pages selected for {}. Using all pages.",
                        display_name(&file)
                    );
                    events.notice(&message);
                    report.notices.push(message);
                }
                extraction.output
            }
            (Some(FileKind::Pdf), _) => file.clone(),
            (Some(FileKind::Docx), _) => {
                let output = scratch.track(&format!("temp_docx_{}.pdf", index));
                self.converter.convert_docx(&file, &output)?
            }
            (Some(FileKind::Image), _) => {
                let output = scratch.track(&format!("temp_image_{}.pdf", index));
                image_to_pdf(&file, &output)?;
                output
            }
            (Some(FileKind::Text), _) => {
                let output = scratch.track(&format!("temp_txt_{}.pdf", index));
                text_to_pdf(&file, &output)?;
                output
            }
            (None, _) => return Err(Error::UnsupportedType(file)),
        };

        merged.append_file(&source).map_err(|e| {
            Error::General(format!("Failed to append {}: {}", source.display(), e))
        })
    }
}

/// Event from a background job
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Progress(f64),
    FileFailed(String),
    Notice(String),
}

/// Forwards pipeline events over a channel
struct ChannelEvents {
    sender: Sender<JobEvent>,
}

impl MergeEvents for ChannelEvents {
    fn progress(&mut self, percent: f64) {
        let _ = self.sender.send(JobEvent::Progress(percent));
    }

    fn file_failed(&mut self, error: &Error) {
        let _ = self.sender.send(JobEvent::FileFailed(error.to_string()));
    }

    fn notice(&mut self, message: &str) {
        let _ = self.sender.send(JobEvent::Notice(message.to_string()));
    }
}

/// Handle to a merge running on a worker thread.
///
/// The job cannot be cancelled; callers poll events and eventually join.
pub struct BackgroundJob {
    events: Receiver<JobEvent>,
    handle: Option<JoinHandle<Result<MergeReport>>>,
}

impl BackgroundJob {
    /// Events received so far, without blocking
    pub fn poll(&self) -> Vec<JobEvent> {
        let mut events = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }

    /// Block until the next event; `None` once the worker has finished
    pub fn next_event(&self) -> Option<JobEvent> {
        self.events.recv().ok()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map(JoinHandle::is_finished).unwrap_or(true)
    }

    /// Wait for the worker and take its result
    pub fn join(mut self) -> Result<MergeReport> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| Error::General("merge worker panicked".to_string()))?,
            None => Err(Error::General("merge result already taken".to_string())),
        }
    }
}
