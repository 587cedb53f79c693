//! PDF metadata for the `info` command

use std::path::Path;

use lopdf::{Document, Object};

use crate::error::{Error, Result};
use crate::pdf::pages::root_pages_id;

/// Summary of a PDF on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfMetadata {
    /// Pages reachable from the page tree
    pub page_count: usize,
    /// `Count` recorded in the root page tree node, if any
    pub declared_count: Option<usize>,
    pub version: String,
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Count the pages of the PDF at `path`
pub fn count_pages(path: &Path) -> Result<usize> {
    Ok(extract_metadata(path)?.page_count)
}

/// Read page counts and document info from the PDF at `path`
pub fn extract_metadata(path: &Path) -> Result<PdfMetadata> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;

    Ok(PdfMetadata {
        page_count: doc.get_pages().len(),
        declared_count: declared_count(&doc),
        version: doc.version.clone(),
        title: info_string(&doc, b"Title"),
        author: info_string(&doc, b"Author"),
    })
}

fn declared_count(doc: &Document) -> Option<usize> {
    let pages_id = root_pages_id(doc).ok()?;
    let count = doc.get_object(pages_id).ok()?.as_dict().ok()?.get(b"Count").ok()?;
    match count {
        Object::Integer(n) if *n >= 0 => Some(*n as usize),
        _ => None,
    }
}

fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let info_id = doc.trailer.get(b"Info").ok()?.as_reference().ok()?;
    let info = doc.get_object(info_id).ok()?.as_dict().ok()?;
    let bytes = info.get(key).ok()?.as_str().ok()?;
    String::from_utf8(bytes.to_vec()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::TextLayout;
    use crate::pdf::create::save_document;
    use lopdf::{dictionary, StringFormat};
    use tempfile::TempDir;

    #[test]
    fn test_missing_file() {
        let result = count_pages(Path::new("/nonexistent/file.pdf"));
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_metadata_of_generated_text_pdf() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("lines.pdf");
        let text: String = (0..60).map(|i| format!("row {i}\n")).collect();
        let mut doc = crate::convert::text::render_text(&text, &TextLayout::default()).unwrap();

        let info_id = doc.add_object(dictionary! {
            "Title" => Object::String(b"Quarterly".to_vec(), StringFormat::Literal),
        });
        doc.trailer.set("Info", info_id);
        save_document(&mut doc, &path).unwrap();

        let metadata = extract_metadata(&path).unwrap();
        assert_eq!(metadata.page_count, 2);
        assert_eq!(metadata.declared_count, Some(2));
        assert_eq!(metadata.title.as_deref(), Some("Quarterly"));
        assert_eq!(metadata.author, None);
        assert_eq!(count_pages(&path).unwrap(), 2);
    }
}
