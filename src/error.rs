//! Error types for the file merger library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the file merger library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input file no longer exists on disk
    #[error("File {} does not exist", .0.display())]
    FileNotFound(PathBuf),

    /// Extension is not one of pdf, docx, txt, jpg/jpeg, png
    #[error("Skipping {}: Unsupported file type", .0.display())]
    UnsupportedType(PathBuf),

    /// Page range text could not be parsed
    #[error("Invalid page format for {file}: {reason}")]
    InvalidRange { file: String, reason: String },

    /// Image, text or DOCX conversion failed
    #[error("Failed to convert {}: {message}", .path.display())]
    ConversionFailure { path: PathBuf, message: String },

    /// Word-processor automation could not be established
    #[error("DOCX conversion requires an office suite, which is not available: {0}")]
    AutomationUnavailable(String),

    /// Page extraction failed
    #[error("Failed to extract pages from {}: {message}", .path.display())]
    ExtractionFailure { path: PathBuf, message: String },

    /// Output PDF could not be written
    #[error("Cannot write to {}: {message}", .path.display())]
    WriteFailure { path: PathBuf, message: String },

    /// A temporary artifact survived every delete attempt
    #[error("Could not delete {} after {attempts} attempts", .path.display())]
    DeleteRetryExhausted { path: PathBuf, attempts: u32 },

    /// Nothing was appended to the output
    #[error("No pages were merged. Check your input files.")]
    NoPagesMerged,

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    pub(crate) fn conversion(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Error::ConversionFailure {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn extraction(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Error::ExtractionFailure {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Map an IO error raised while writing `path` into a `WriteFailure`
    pub(crate) fn write(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        let message = if err.kind() == std::io::ErrorKind::PermissionDenied {
            "ensure it's not open and you have permissions".to_string()
        } else {
            err.to_string()
        };
        Error::WriteFailure {
            path: path.into(),
            message,
        }
    }
}
