//! PDF creation helpers shared by the converters
//!
//! Builds small documents from scratch with lopdf: one flat page tree, one
//! catalog, pages of a fixed size.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use lopdf::content::Content;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tracing::warn;

use crate::error::{Error, Result};
use crate::layout::PageDimensions;

/// Incrementally assembles a new PDF document
pub(crate) struct DocumentBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    media_box: [f32; 4],
}

impl DocumentBuilder {
    pub(crate) fn new(size: PageDimensions) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            media_box: size.media_box(),
        }
    }

    /// Add a shared object (font, image) and return its id
    pub(crate) fn add_object(&mut self, object: impl Into<Object>) -> ObjectId {
        self.doc.add_object(object)
    }

    /// Append a page drawing `content` with the given resources
    pub(crate) fn add_page(&mut self, content: Content, resources: Dictionary) -> Result<ObjectId> {
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.encode()?));

        let media_box: Vec<Object> = self.media_box.iter().map(|v| Object::Real(*v)).collect();
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => media_box,
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.kids.push(page_id);
        Ok(page_id)
    }

    pub(crate) fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Close the page tree and catalog
    pub(crate) fn finish(mut self) -> Document {
        let kids: Vec<Object> = self.kids.iter().map(|&id| Object::Reference(id)).collect();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.kids.len() as i64,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc
    }
}

/// Helvetica, one of the 14 standard PDF fonts, with WinAnsi encoding
pub(crate) fn helvetica_font() -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Compress and write `doc` to `path`.
///
/// Any failure while creating or writing the file surfaces as `WriteFailure`,
/// and a partially written file is removed.
pub fn save_document(doc: &mut Document, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::write(path, &e))?;
    let mut writer = BufWriter::new(file);

    doc.compress();
    let result = write_document(doc, &mut writer, path).and_then(|()| {
        writer
            .into_inner()
            .map_err(|e| Error::write(path, e.error()))?
            .sync_all()
            .map_err(|e| Error::write(path, &e))
    });

    if result.is_err() {
        discard_partial(path);
    }
    result
}

/// Serialize `doc` into `writer`, reporting errors against `path`
fn write_document<W: Write>(doc: &mut Document, writer: &mut W, path: &Path) -> Result<()> {
    doc.save_to(writer).map_err(|e| Error::WriteFailure {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    writer.flush().map_err(|e| Error::write(path, &e))
}

fn discard_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!("Could not remove partial output {}: {}", path.display(), e);
    }
}
