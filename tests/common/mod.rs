//! Fixture generation shared by the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use file_merger::convert::DocxConverter;
use file_merger::pipeline::MergeEvents;
use file_merger::{Error, Result};
use image::{Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

/// Write a PDF whose pages show "<prefix> 1", "<prefix> 2", ...
pub fn labelled_pdf(path: &Path, prefix: &str, pages: usize) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for n in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("{} {}", prefix, n).into_bytes(),
                        StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save(path).unwrap();
    path.to_path_buf()
}

/// Write a small solid-colour PNG
pub fn png(path: &Path, width: u32, height: u32) -> PathBuf {
    RgbImage::from_pixel(width, height, Rgb([30, 120, 200]))
        .save(path)
        .unwrap();
    path.to_path_buf()
}

/// Write a text file
pub fn text(path: &Path, contents: &str) -> PathBuf {
    fs::write(path, contents).unwrap();
    path.to_path_buf()
}

/// The text shown on each page of the PDF at `path`, in page order.
///
/// Pages without a text operator are reported as an empty string.
pub fn page_labels(path: &Path) -> Vec<String> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|page_id| {
            let bytes = doc.get_page_content(*page_id).unwrap();
            let content = Content::decode(&bytes).unwrap();
            content
                .operations
                .iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| op.operands.first())
                .filter_map(|operand| operand.as_str().ok())
                .map(|raw| String::from_utf8_lossy(raw).into_owned())
                .next()
                .unwrap_or_default()
        })
        .collect()
}

/// Entries left in a directory
pub fn dir_entries(dir: &Path) -> Vec<PathBuf> {
    match fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

/// Stands in for the office suite: "converts" a DOCX by writing a labelled
/// PDF named after the input.
pub struct FakeOffice {
    pub available: bool,
    pub pages: usize,
    pub calls: AtomicUsize,
}

impl FakeOffice {
    pub fn available(pages: usize) -> Self {
        Self {
            available: true,
            pages,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            pages: 0,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DocxConverter for FakeOffice {
    fn is_available(&self) -> bool {
        self.available
    }

    fn convert_docx(&self, input: &Path, output: &Path) -> Result<PathBuf> {
        if !self.available {
            return Err(Error::AutomationUnavailable("no office suite".to_string()));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(labelled_pdf(output, &stem, self.pages))
    }
}

/// Records every event the pipeline sends
#[derive(Default)]
pub struct Recorder {
    pub progress: Vec<f64>,
    pub failures: Vec<String>,
    pub notices: Vec<String>,
}

impl MergeEvents for Recorder {
    fn progress(&mut self, percent: f64) {
        self.progress.push(percent);
    }

    fn file_failed(&mut self, error: &Error) {
        self.failures.push(error.to_string());
    }

    fn notice(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}
