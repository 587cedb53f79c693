//! Input files and per-file page selections

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of input, derived from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Pdf,
    Docx,
    Text,
    Image,
}

impl FileKind {
    /// Extensions accepted by the file picker, in display order
    pub const EXTENSIONS: &'static [&'static str] = &["pdf", "docx", "txt", "jpg", "jpeg", "png"];

    /// Classify a path by extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(FileKind::Pdf),
            "docx" => Some(FileKind::Docx),
            "txt" => Some(FileKind::Text),
            "jpg" | "jpeg" | "png" => Some(FileKind::Image),
            _ => None,
        }
    }

    /// Whether a page selection can apply to this kind
    pub fn supports_page_selection(&self) -> bool {
        matches!(self, FileKind::Pdf | FileKind::Docx)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FileKind::Pdf => "PDF",
            FileKind::Docx => "DOCX",
            FileKind::Text => "TXT",
            FileKind::Image => "IMAGE",
        };
        f.write_str(label)
    }
}

/// A file in the merge list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    path: PathBuf,
    kind: FileKind,
}

impl InputFile {
    /// Build an entry for `path`, made absolute against the working directory.
    ///
    /// Returns `None` when the extension is not supported.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = absolute(path.as_ref());
        let kind = FileKind::from_path(&path)?;
        Some(Self { path, kind })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// File name for display
    pub fn display_name(&self) -> String {
        display_name(&self.path)
    }
}

/// Per-file page selections, keyed by absolute path.
///
/// An absent entry and an empty entry both mean "all pages".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSelection {
    pages: HashMap<PathBuf, Vec<usize>>,
}

impl PageSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pages for `path`; an empty list clears the entry
    pub fn set(&mut self, path: impl AsRef<Path>, pages: Vec<usize>) {
        let key = absolute(path.as_ref());
        if pages.is_empty() {
            self.pages.remove(&key);
        } else {
            self.pages.insert(key, pages);
        }
    }

    /// Pages selected for `path`, if any
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&[usize]> {
        self.pages
            .get(&absolute(path.as_ref()))
            .map(Vec::as_slice)
            .filter(|pages| !pages.is_empty())
    }

    pub fn clear(&mut self, path: impl AsRef<Path>) {
        self.pages.remove(&absolute(path.as_ref()));
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Make `path` absolute without requiring it to exist
pub(crate) fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(FileKind::from_path(Path::new("a.pdf")), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_path(Path::new("a.PDF")), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_path(Path::new("a.docx")), Some(FileKind::Docx));
        assert_eq!(FileKind::from_path(Path::new("notes.txt")), Some(FileKind::Text));
        assert_eq!(FileKind::from_path(Path::new("a.jpeg")), Some(FileKind::Image));
        assert_eq!(FileKind::from_path(Path::new("a.Png")), Some(FileKind::Image));
        assert_eq!(FileKind::from_path(Path::new("a.doc")), None);
        assert_eq!(FileKind::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_input_file_is_absolute() {
        let file = InputFile::new("some/dir/scan.jpg").unwrap();
        assert!(file.path().is_absolute());
        assert_eq!(file.kind(), FileKind::Image);
        assert_eq!(file.display_name(), "scan.jpg");
    }

    #[test]
    fn test_input_file_rejects_unsupported() {
        assert!(InputFile::new("archive.zip").is_none());
    }

    #[test]
    fn test_page_selection_relative_and_absolute_keys_match() {
        let mut selection = PageSelection::new();
        selection.set("report.pdf", vec![2, 0]);

        let abs = absolute(Path::new("report.pdf"));
        assert_eq!(selection.get(&abs), Some(&[2, 0][..]));
        assert_eq!(selection.get("report.pdf"), Some(&[2, 0][..]));
    }

    #[test]
    fn test_page_selection_empty_clears() {
        let mut selection = PageSelection::new();
        selection.set("a.pdf", vec![1]);
        selection.set("a.pdf", vec![]);
        assert!(selection.get("a.pdf").is_none());
        assert!(selection.is_empty());
    }

    #[test]
    fn test_page_selection_clear() {
        let mut selection = PageSelection::new();
        selection.set("a.pdf", vec![1]);
        selection.set("b.pdf", vec![0]);
        selection.clear("a.pdf");
        assert_eq!(selection.len(), 1);
        assert!(selection.get("b.pdf").is_some());
    }
}
