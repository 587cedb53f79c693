//! The file list the user is assembling

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::input::{FileKind, InputFile, PageSelection};
use crate::pipeline::MergeJob;
use crate::ranges::parse_page_ranges;

use super::dnd::split_drop_payload;

/// Result of adding files to the session
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    pub added: Vec<PathBuf>,
    /// One message per rejected path
    pub skipped: Vec<String>,
}

/// Ordered input files plus their page selections
#[derive(Debug, Clone)]
pub struct Session {
    files: Vec<InputFile>,
    selection: PageSelection,
    docx_available: bool,
}

impl Session {
    pub fn new(docx_available: bool) -> Self {
        Self {
            files: Vec::new(),
            selection: PageSelection::new(),
            docx_available,
        }
    }

    pub fn files(&self) -> &[InputFile] {
        &self.files
    }

    pub fn selection(&self) -> &PageSelection {
        &self.selection
    }

    pub fn docx_available(&self) -> bool {
        self.docx_available
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Add existing files with supported extensions, ignoring duplicates
    pub fn add<I, P>(&mut self, paths: I) -> AddOutcome
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut outcome = AddOutcome::default();

        for path in paths {
            let path = path.as_ref();
            if !path.is_file() {
                outcome.skipped.push(format!("Skipping {}: file not found", path.display()));
                continue;
            }
            let Some(file) = InputFile::new(path) else {
                outcome
                    .skipped
                    .push(format!("Skipping {}: unsupported file type", path.display()));
                continue;
            };
            if self.files.iter().any(|f| f.path() == file.path()) {
                debug!("Ignoring duplicate {}", file.path().display());
                continue;
            }
            if file.kind() == FileKind::Docx && !self.docx_available {
                let message = format!(
                    "Skipping {}: DOCX conversion disabled",
                    file.display_name()
                );
                warn!("{}", message);
                outcome.skipped.push(message);
                continue;
            }

            outcome.added.push(file.path().to_path_buf());
            self.files.push(file);
        }

        debug!("Files after add: {:?}", self.paths());
        outcome
    }

    /// Add the files named in a drag-and-drop payload
    pub fn drop_payload(&mut self, payload: &str) -> AddOutcome {
        let paths: Vec<PathBuf> = split_drop_payload(payload)
            .into_iter()
            .map(PathBuf::from)
            .filter(|path| path.exists())
            .collect();
        self.add(paths)
    }

    /// Remove the file at `index` together with its page selection
    pub fn remove(&mut self, index: usize) -> Result<InputFile> {
        self.check_index(index)?;
        let file = self.files.remove(index);
        self.selection.clear(file.path());
        debug!("Removed file: {}", file.path().display());
        Ok(file)
    }

    /// Move the file at `index` one place earlier. Returns whether it moved.
    pub fn move_up(&mut self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        if index == 0 {
            return Ok(false);
        }
        self.files.swap(index - 1, index);
        Ok(true)
    }

    /// Move the file at `index` one place later. Returns whether it moved.
    pub fn move_down(&mut self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        if index + 1 >= self.files.len() {
            return Ok(false);
        }
        self.files.swap(index, index + 1);
        Ok(true)
    }

    /// Parse `text` as the page selection for the file at `index`.
    ///
    /// Blank text clears the selection. Nothing changes if parsing fails.
    pub fn set_pages(&mut self, index: usize, text: &str) -> Result<Vec<usize>> {
        self.check_index(index)?;
        let file = &self.files[index];

        match file.kind() {
            FileKind::Pdf => {}
            FileKind::Docx if self.docx_available => {}
            FileKind::Docx => {
                return Err(Error::AutomationUnavailable(format!(
                    "cannot select pages of {}",
                    file.display_name()
                )))
            }
            kind => {
                return Err(Error::General(format!(
                    "Page selection is not supported for {} files",
                    kind
                )))
            }
        }

        let pages = parse_page_ranges(text, &file.display_name())?;
        self.selection.set(file.path(), pages.clone());
        debug!("Pages for {}: {:?}", file.path().display(), pages);
        Ok(pages)
    }

    /// Pages selected for the file at `index`
    pub fn pages(&self, index: usize) -> Option<&[usize]> {
        self.files
            .get(index)
            .and_then(|file| self.selection.get(file.path()))
    }

    /// Snapshot the current list as a job writing to `output`
    pub fn job(&self, output: impl Into<PathBuf>) -> MergeJob {
        MergeJob::new(self.paths(), output).with_selection(self.selection.clone())
    }

    fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path().to_path_buf()).collect()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.files.len() {
            Ok(())
        } else {
            Err(Error::General(format!("No file at position {}", index + 1)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn test_add_filters_and_dedupes() {
        let dir = TempDir::new().unwrap();
        let pdf = touch(&dir, "a.pdf");
        let png = touch(&dir, "b.PNG");
        let odt = touch(&dir, "c.odt");
        let missing = dir.path().join("gone.txt");

        let mut session = Session::new(true);
        let outcome = session.add([&pdf, &png, &odt, &missing, &pdf]);

        assert_eq!(outcome.added, vec![pdf.clone(), png.clone()]);
        assert_eq!(outcome.skipped.len(), 2);
        assert_eq!(session.files().len(), 2);
        assert_eq!(session.files()[1].kind(), FileKind::Image);
    }

    #[test]
    fn test_docx_skipped_when_unavailable() {
        let dir = TempDir::new().unwrap();
        let docx = touch(&dir, "report.docx");

        let mut session = Session::new(false);
        let outcome = session.add([&docx]);
        assert!(outcome.added.is_empty());
        assert_eq!(outcome.skipped, vec!["Skipping report.docx: DOCX conversion disabled"]);

        let mut session = Session::new(true);
        assert_eq!(session.add([&docx]).added, vec![docx]);
    }

    #[test]
    fn test_drop_payload_with_braces() {
        let dir = TempDir::new().unwrap();
        let spaced = touch(&dir, "my notes.txt");
        let plain = touch(&dir, "scan.jpg");
        let payload = format!("{{{}}} {} /definitely/missing.pdf", spaced.display(), plain.display());

        let mut session = Session::new(true);
        let outcome = session.drop_payload(&payload);
        assert_eq!(outcome.added, vec![spaced, plain]);
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_reorder_is_bounded() {
        let dir = TempDir::new().unwrap();
        let a = touch(&dir, "a.pdf");
        let b = touch(&dir, "b.pdf");
        let c = touch(&dir, "c.pdf");

        let mut session = Session::new(true);
        session.add([&a, &b, &c]);

        assert!(!session.move_up(0).unwrap());
        assert!(!session.move_down(2).unwrap());
        assert!(session.move_down(0).unwrap());
        assert!(session.move_up(2).unwrap());

        let order: Vec<&Path> = session.files().iter().map(InputFile::path).collect();
        assert_eq!(order, vec![b.as_path(), c.as_path(), a.as_path()]);
        assert!(session.move_up(3).is_err());
    }

    #[test]
    fn test_set_pages_and_remove() {
        let dir = TempDir::new().unwrap();
        let pdf = touch(&dir, "a.pdf");
        let txt = touch(&dir, "b.txt");

        let mut session = Session::new(true);
        session.add([&pdf, &txt]);

        assert_eq!(session.set_pages(0, "1,3-4").unwrap(), vec![0, 2, 3]);
        assert_eq!(session.pages(0), Some(&[0, 2, 3][..]));

        // Failed parse keeps the previous selection
        assert!(matches!(
            session.set_pages(0, "3-2"),
            Err(Error::InvalidRange { .. })
        ));
        assert_eq!(session.pages(0), Some(&[0, 2, 3][..]));

        assert!(session.set_pages(1, "1").is_err());

        session.set_pages(0, "  ").unwrap();
        assert_eq!(session.pages(0), None);

        session.set_pages(0, "2").unwrap();
        session.remove(0).unwrap();
        assert!(session.selection().is_empty());
        assert_eq!(session.files().len(), 1);
    }

    #[test]
    fn test_job_snapshot() {
        let dir = TempDir::new().unwrap();
        let pdf = touch(&dir, "a.pdf");
        let mut session = Session::new(true);
        session.add([&pdf]);
        session.set_pages(0, "2,1").unwrap();

        let job = session.job(dir.path().join("out.pdf"));
        assert_eq!(job.inputs, vec![pdf.clone()]);
        assert_eq!(job.selection.get(&pdf), Some(&[1, 0][..]));

        // Later edits do not change the snapshot
        session.remove(0).unwrap();
        assert_eq!(job.inputs.len(), 1);
    }
}
