//! Interactive terminal front end
//!
//! The shell keeps a [`Session`] and runs merges on a background thread so
//! the prompt stays usable while a merge is in progress. Only one merge runs
//! at a time and it cannot be cancelled; `quit` waits for it.

pub mod command;
pub mod dnd;
pub mod progress;
pub mod session;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use tracing::debug;

use crate::pipeline::{BackgroundJob, JobEvent, MergePipeline};

use self::command::{parse_command, Command, ParseError};
use self::progress::{render_bar, ProgressThrottle};
pub use self::session::{AddOutcome, Session};

const PROMPT: &str = "file-merger> ";

/// A merge running in the background
struct RunningJob {
    job: BackgroundJob,
    output: PathBuf,
    throttle: ProgressThrottle,
    shown: u32,
}

/// Line-oriented shell over any reader and writer
pub struct Shell<R, W> {
    input: R,
    output: W,
    session: Session,
    pipeline: MergePipeline,
    running: Option<RunningJob>,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(pipeline: MergePipeline, input: R, output: W) -> Self {
        Self {
            input,
            output,
            session: Session::new(pipeline.docx_available()),
            pipeline,
            running: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Read and execute commands until `quit` or end of input
    pub fn run(&mut self) -> io::Result<()> {
        writeln!(self.output, "Type 'help' for a list of commands.")?;

        loop {
            self.drain_events()?;
            write!(self.output, "{}", PROMPT)?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                writeln!(self.output)?;
                break;
            };

            match parse_command(&line) {
                Ok(Command::Quit) => break,
                Ok(command) => self.execute(command)?,
                Err(ParseError::Empty) => {}
                Err(e) => writeln!(self.output, "{}", e)?,
            }
        }

        if self.running.is_some() {
            writeln!(self.output, "Waiting for the running merge to finish...")?;
            self.wait()?;
        }
        Ok(())
    }

    /// Execute one parsed command
    pub fn execute(&mut self, command: Command) -> io::Result<()> {
        debug!("Executing {:?}", command);
        match command {
            Command::Add(paths) => {
                let outcome = self.session.add(&paths);
                self.report_added(outcome)
            }
            Command::Drop(payload) => {
                let outcome = self.session.drop_payload(&payload);
                self.report_added(outcome)
            }
            Command::List => self.list(),
            Command::Remove(index) => match self.session.remove(index) {
                Ok(file) => writeln!(self.output, "Removed {}", file.display_name()),
                Err(e) => writeln!(self.output, "{}", e),
            },
            Command::Up(index) => {
                let moved = self.session.move_up(index);
                self.report_move(moved)
            }
            Command::Down(index) => {
                let moved = self.session.move_down(index);
                self.report_move(moved)
            }
            Command::Pages(index, text) => self.set_pages(index, &text),
            Command::Merge(output) => self.merge(output),
            Command::Status => self.status(),
            Command::Wait => {
                if self.running.is_none() {
                    writeln!(self.output, "No merge is running")
                } else {
                    self.wait()
                }
            }
            Command::Help => self.help(),
            Command::Quit => Ok(()),
        }
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn report_added(&mut self, outcome: AddOutcome) -> io::Result<()> {
        for message in &outcome.skipped {
            writeln!(self.output, "Warning: {}", message)?;
        }
        writeln!(
            self.output,
            "Added {} file(s), {} in list",
            outcome.added.len(),
            self.session.files().len()
        )
    }

    fn report_move(&mut self, moved: crate::Result<bool>) -> io::Result<()> {
        match moved {
            Ok(true) => self.list(),
            Ok(false) => Ok(()),
            Err(e) => writeln!(self.output, "{}", e),
        }
    }

    fn list(&mut self) -> io::Result<()> {
        if self.session.is_empty() {
            return writeln!(self.output, "No files added");
        }
        for (index, file) in self.session.files().iter().enumerate() {
            let pages = match self.session.pages(index) {
                Some(pages) => {
                    let shown: Vec<String> = pages.iter().map(|p| (p + 1).to_string()).collect();
                    format!("pages {}", shown.join(","))
                }
                None => "all pages".to_string(),
            };
            writeln!(
                self.output,
                "{:>3}. {} [{}] {}",
                index + 1,
                file.display_name(),
                file.kind(),
                pages
            )?;
        }
        Ok(())
    }

    fn set_pages(&mut self, index: usize, text: &str) -> io::Result<()> {
        match self.session.set_pages(index, text) {
            Ok(pages) if pages.is_empty() => writeln!(self.output, "Using all pages"),
            Ok(pages) => writeln!(self.output, "Selected {} page(s)", pages.len()),
            Err(e) => writeln!(self.output, "Error: {}", e),
        }
    }

    fn merge(&mut self, output: Option<String>) -> io::Result<()> {
        if self.running.is_some() {
            return writeln!(self.output, "A merge is already running; use 'wait' or 'status'");
        }
        if self.session.is_empty() {
            return writeln!(self.output, "Warning: No files selected");
        }

        let output = match output {
            Some(output) => output,
            None => {
                write!(self.output, "Save merged PDF as: ")?;
                self.output.flush()?;
                match self.read_line()? {
                    Some(line) if !line.trim().is_empty() => line.trim().to_string(),
                    _ => return writeln!(self.output, "Merge cancelled"),
                }
            }
        };
        let output = with_pdf_extension(PathBuf::from(output));

        let job = self.session.job(&output);
        writeln!(
            self.output,
            "Merging {} file(s) into {}",
            job.inputs.len(),
            output.display()
        )?;

        self.running = Some(RunningJob {
            job: self.pipeline.spawn(job),
            output,
            throttle: ProgressThrottle::new(),
            shown: 0,
        });
        Ok(())
    }

    fn status(&mut self) -> io::Result<()> {
        self.drain_events()?;
        match &self.running {
            Some(running) => writeln!(
                self.output,
                "Merging into {} {}",
                running.output.display(),
                render_bar(running.shown)
            ),
            None => writeln!(self.output, "No merge is running"),
        }
    }

    /// Block until the running merge finishes, printing its events
    fn wait(&mut self) -> io::Result<()> {
        loop {
            let event = match &self.running {
                Some(running) => running.job.next_event(),
                None => return Ok(()),
            };
            match event {
                Some(event) => self.show_event(event)?,
                None => break,
            }
        }
        self.finish()
    }

    /// Print pending events and collect a finished merge
    fn drain_events(&mut self) -> io::Result<()> {
        let (events, finished) = match &self.running {
            Some(running) => {
                let finished = running.job.is_finished();
                (running.job.poll(), finished)
            }
            None => return Ok(()),
        };

        for event in events {
            self.show_event(event)?;
        }
        if finished {
            self.finish()?;
        }
        Ok(())
    }

    fn show_event(&mut self, event: JobEvent) -> io::Result<()> {
        match event {
            JobEvent::Progress(percent) => {
                let Some(running) = self.running.as_mut() else {
                    return Ok(());
                };
                if let Some(band) = running.throttle.update(percent) {
                    running.shown = band;
                    writeln!(self.output, "{}", render_bar(band))?;
                }
                Ok(())
            }
            JobEvent::FileFailed(message) => writeln!(self.output, "Error: {}", message),
            JobEvent::Notice(message) => writeln!(self.output, "Note: {}", message),
        }
    }

    fn finish(&mut self) -> io::Result<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        // Anything sent between the last poll and the worker exiting
        for event in running.job.poll() {
            writeln!(self.output, "{}", describe_late_event(&event))?;
        }

        match running.job.join() {
            Ok(report) => {
                writeln!(
                    self.output,
                    "Success: merged {} file(s), {} page(s) into {}",
                    report.files_merged,
                    report.pages,
                    report.output.display()
                )?;
                if !report.skipped.is_empty() {
                    writeln!(self.output, "Skipped {} file(s)", report.skipped.len())?;
                }
                for path in &report.cleanup_failures {
                    writeln!(
                        self.output,
                        "Warning: could not delete temporary file {}",
                        path.display()
                    )?;
                }
                Ok(())
            }
            Err(e) => writeln!(self.output, "Merge failed: {}", e),
        }
    }

    fn help(&mut self) -> io::Result<()> {
        writeln!(self.output, "{}", help_text(self.session.docx_available()))
    }
}

fn describe_late_event(event: &JobEvent) -> String {
    match event {
        JobEvent::Progress(percent) => render_bar(*percent as u32),
        JobEvent::FileFailed(message) => format!("Error: {}", message),
        JobEvent::Notice(message) => format!("Note: {}", message),
    }
}

/// Append `.pdf` when the destination has no extension
pub fn with_pdf_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension("pdf")
    }
}

pub fn help_text(docx_available: bool) -> String {
    let mut text = String::from(
        "Commands:
  add <file>...        Add PDF, DOCX, TXT, JPG or PNG files (quote paths with spaces)
  drop <payload>       Add files from a drag-and-drop payload, e.g. {/my dir/a.pdf} /b.png
  list                 Show files in merge order
  remove <n>           Remove file n from the list
  up <n>, down <n>     Move file n one place
  pages <n> [ranges]   Select pages of PDF/DOCX file n, e.g. 1,3-5 (blank for all pages)
  merge [output]       Merge into one PDF in the background
  status               Show progress of the running merge
  wait                 Wait for the running merge to finish
  help                 Show this help
  quit                 Exit, waiting for a running merge
",
    );
    if docx_available {
        text.push_str("Note: DOCX conversion requires LibreOffice.");
    } else {
        text.push_str(
            "Note: DOCX conversion is disabled because LibreOffice could not be started. \
             Install LibreOffice or pass --soffice with the path to soffice.",
        );
    }
    text
}
