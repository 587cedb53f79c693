//! File Merger Library
//!
//! Merges PDF, DOCX, plain text and JPEG/PNG files into a single PDF, with
//! optional per-file page selection. This library provides functionality to:
//! - Parse page range expressions such as `1,3-5`
//! - Convert images, text and (through LibreOffice) DOCX files to PDF
//! - Extract selected pages from PDF and DOCX inputs
//! - Run a merge job, collecting per-file failures instead of aborting
//! - Drive all of the above from an interactive terminal shell
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! use file_merger::config::{OfficeConfig, PipelineSettings};
//! use file_merger::convert::OfficeAutomation;
//! use file_merger::pipeline::{MergeJob, MergePipeline, NoEvents};
//!
//! let office = OfficeAutomation::detect(&OfficeConfig::default());
//! let pipeline = MergePipeline::new(Arc::new(office), PipelineSettings::default());
//!
//! let job = MergeJob::new(
//!     vec![PathBuf::from("cover.docx"), PathBuf::from("scan.png")],
//!     "packet.pdf",
//! );
//! let report = pipeline.run(&job, &mut NoEvents).expect("merge failed");
//! println!("{} pages", report.pages);
//! ```

pub mod config;
pub mod convert;
pub mod error;
pub mod input;
pub mod layout;
pub mod pdf;
pub mod pipeline;
pub mod ranges;
pub mod scratch;
pub mod shell;

// Re-export commonly used items
pub use error::{Error, Result};
pub use input::{FileKind, InputFile, PageSelection};
pub use pipeline::{MergeJob, MergePipeline, MergeReport};
pub use ranges::parse_page_ranges;
