//! PDF merging functionality using lopdf

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

use crate::error::{Error, Result};
use crate::pdf::create::save_document;
use crate::pdf::pages::{is_tree_node, materialize_inherited, page_ids};

/// Collects pages from many source PDFs and writes them as one document.
///
/// Based on the lopdf merge example:
/// https://github.com/J-F-Liu/lopdf/blob/main/examples/merge.rs
///
/// # Example
///
/// ```no_run
/// use file_merger::pdf::PdfAccumulator;
/// use std::path::Path;
///
/// let mut merged = PdfAccumulator::new();
/// merged.append_file(Path::new("1. first.pdf")).expect("Failed to load");
/// merged.append_file(Path::new("2. second.pdf")).expect("Failed to load");
/// merged.write(Path::new("merged.pdf")).expect("Failed to write");
/// ```
#[derive(Debug, Default)]
pub struct PdfAccumulator {
    objects: BTreeMap<ObjectId, Object>,
    pages: Vec<ObjectId>,
    max_id: u32,
}

impl PdfAccumulator {
    pub fn new() -> Self {
        Self {
            max_id: 1,
            ..Default::default()
        }
    }

    /// Load a PDF from disk and append all of its pages.
    ///
    /// Returns the number of pages appended.
    pub fn append_file(&mut self, path: &Path) -> Result<usize> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let doc = Document::load(path)?;
        let appended = self.append_document(doc)?;
        debug!("Appended {} pages from {}", appended, path.display());
        Ok(appended)
    }

    /// Append every page of an in-memory document
    pub fn append_document(&mut self, mut doc: Document) -> Result<usize> {
        for page_id in page_ids(&doc) {
            materialize_inherited(&mut doc, page_id)?;
        }

        // Renumber objects in this document to avoid conflicts
        doc.renumber_objects_with(self.max_id);
        self.max_id = doc.max_id + 1;

        // Page ids changed with the renumbering
        let pages = page_ids(&doc);

        // The old catalog and page tree nodes are replaced on write
        self.objects.extend(
            doc.objects
                .into_iter()
                .filter(|(_, object)| !is_tree_node(object)),
        );
        self.pages.extend(&pages);

        Ok(pages.len())
    }

    /// Total pages collected so far
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Build the combined document
    pub fn into_document(self) -> Document {
        let mut merged_doc = Document::with_version("1.5");
        merged_doc.objects.extend(self.objects);

        // new_object_id() must not collide with the collected objects
        merged_doc.max_id = self.max_id - 1;

        let pages_id = merged_doc.new_object_id();

        let kids: Vec<Object> = self.pages.iter().map(|&id| Object::Reference(id)).collect();
        let mut pages_object = Dictionary::new();
        pages_object.set("Type", Object::Name(b"Pages".to_vec()));
        pages_object.set("Count", Object::Integer(self.pages.len() as i64));
        pages_object.set("Kids", Object::Array(kids));

        let catalog_id = merged_doc.new_object_id();
        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));

        merged_doc.objects.insert(catalog_id, Object::Dictionary(catalog));
        merged_doc.objects.insert(pages_id, Object::Dictionary(pages_object));
        merged_doc.trailer.set("Root", Object::Reference(catalog_id));

        for &page_id in &self.pages {
            if let Ok(Object::Dictionary(dict)) = merged_doc.get_object_mut(page_id) {
                dict.set("Parent", Object::Reference(pages_id));
            }
        }

        merged_doc
    }

    /// Write the combined document to `path`
    pub fn write(self, path: &Path) -> Result<usize> {
        if self.is_empty() {
            return Err(Error::NoPagesMerged);
        }
        let page_count = self.page_count();
        let mut doc = self.into_document();
        save_document(&mut doc, path)?;
        Ok(page_count)
    }
}
