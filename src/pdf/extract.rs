//! Page extraction
//!
//! Produces a new PDF holding only the requested pages of a PDF or DOCX
//! input, in the order requested. Duplicate indices are allowed, so a user
//! can repeat or reverse pages.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use lopdf::{Document, Object, ObjectId};
use tracing::{info, warn};

use crate::convert::DocxConverter;
use crate::error::{Error, Result};
use crate::input::{display_name, FileKind};
use crate::pdf::create::save_document;
use crate::pdf::pages::{materialize_inherited, page_ids, root_pages_id};
use crate::scratch::ScratchSpace;

/// Result of a page extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// The PDF holding the selected pages
    pub output: PathBuf,
    /// Temporary DOCX → PDF conversion, tracked in the scratch space
    pub intermediate: Option<PathBuf>,
    /// Zero-based source pages written, in output order
    pub pages: Vec<usize>,
    /// True when no requested page existed and every page was used instead
    pub fell_back: bool,
}

/// Selected pages of an in-memory document
#[derive(Debug)]
pub struct Selection {
    pub document: Document,
    pub pages: Vec<usize>,
    pub fell_back: bool,
}

/// Extracts pages from PDF and DOCX inputs
pub struct PageExtractor<'a> {
    converter: &'a dyn DocxConverter,
}

impl<'a> PageExtractor<'a> {
    pub fn new(converter: &'a dyn DocxConverter) -> Self {
        Self { converter }
    }

    /// Write the pages of `input` listed in `pages` to `output`.
    ///
    /// DOCX inputs are converted first into a temporary PDF tracked by
    /// `scratch`; that conversion failing fails the whole extraction.
    pub fn extract(
        &self,
        input: &Path,
        pages: &[usize],
        output: &Path,
        scratch: &mut ScratchSpace,
    ) -> Result<Extraction> {
        let start = Instant::now();

        let (source, intermediate) = match FileKind::from_path(input) {
            Some(FileKind::Docx) => {
                if !self.converter.is_available() {
                    return Err(Error::AutomationUnavailable(
                        "DOCX page extraction is disabled".to_string(),
                    ));
                }
                let temp_pdf = scratch.track(&format!("temp_{}.pdf", display_name(input)));
                self.converter.convert_docx(input, &temp_pdf)?;
                (temp_pdf.clone(), Some(temp_pdf))
            }
            Some(FileKind::Pdf) => (input.to_path_buf(), None),
            _ => return Err(Error::UnsupportedType(input.to_path_buf())),
        };

        let doc = Document::load(&source).map_err(|e| Error::extraction(input, e))?;
        let mut selection = select_pages(doc, pages).map_err(|e| Error::extraction(input, e))?;

        if selection.fell_back {
            warn!(
                "No valid pages selected for {}. Using all pages.",
                display_name(input)
            );
        }

        save_document(&mut selection.document, output).map_err(|e| Error::extraction(input, e))?;

        info!(
            "Extracted pages {:?} from {} to {} in {:.2}s",
            selection.pages,
            input.display(),
            output.display(),
            start.elapsed().as_secs_f64()
        );

        Ok(Extraction {
            output: output.to_path_buf(),
            intermediate,
            pages: selection.pages,
            fell_back: selection.fell_back,
        })
    }
}

/// Restrict `doc` to the pages at `indices` (zero-based), in that order.
///
/// Indices outside `0..page_count` are dropped. If none remain, every page
/// is kept and `fell_back` is set.
pub fn select_pages(mut doc: Document, indices: &[usize]) -> Result<Selection> {
    let source_pages = page_ids(&doc);
    let total = source_pages.len();
    if total == 0 {
        return Err(Error::General("document has no pages".to_string()));
    }

    let mut pages: Vec<usize> = indices.iter().copied().filter(|&i| i < total).collect();
    let fell_back = pages.is_empty();
    if fell_back {
        pages = (0..total).collect();
    }

    for &page_id in &source_pages {
        materialize_inherited(&mut doc, page_id)?;
    }

    let pages_id = root_pages_id(&doc)?;

    // A repeated page gets its own page object sharing the same content
    let mut seen: HashSet<ObjectId> = HashSet::new();
    let mut kids: Vec<ObjectId> = Vec::with_capacity(pages.len());
    for &index in &pages {
        let source = source_pages[index];
        let page_id = if seen.insert(source) {
            source
        } else {
            let copy = doc.get_object(source)?.clone();
            doc.add_object(copy)
        };
        kids.push(page_id);
    }

    for &page_id in &kids {
        let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
        page.set("Parent", Object::Reference(pages_id));
    }

    let root = doc.get_object_mut(pages_id)?.as_dict_mut()?;
    root.set(
        "Kids",
        Object::Array(kids.iter().map(|&id| Object::Reference(id)).collect()),
    );
    root.set("Count", Object::Integer(kids.len() as i64));

    doc.prune_objects();

    Ok(Selection {
        document: doc,
        pages,
        fell_back,
    })
}
