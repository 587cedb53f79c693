//! PDF manipulation module

pub mod create;
pub mod extract;
pub mod merge;
pub mod metadata;
pub(crate) mod pages;

// Re-export commonly used items
pub use create::save_document;
pub use extract::{select_pages, Extraction, PageExtractor, Selection};
pub use merge::PdfAccumulator;
pub use metadata::{count_pages, extract_metadata, PdfMetadata};
