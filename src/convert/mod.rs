//! Conversion of non-PDF inputs into standalone PDF files
//!
//! Images and plain text are rendered directly with lopdf. DOCX files are
//! handed to an office suite driven headless; see [`docx`].

pub mod docx;
pub mod image;
pub mod text;

pub use self::docx::{DocxConverter, OfficeAutomation, SaveStrategy};
pub use self::image::image_to_pdf;
pub use self::text::text_to_pdf;
