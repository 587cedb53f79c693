//! Runtime settings
//!
//! There is no configuration file. Settings have defaults matching the
//! desktop behaviour and can be overridden from the command line or the
//! environment (see the binary's global arguments).

use std::path::PathBuf;
use std::time::Duration;

/// Name of the scratch directory created under the working directory
pub const SCRATCH_DIR_NAME: &str = "temp_split";

/// Settings for one merge pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Where intermediate PDFs are written
    pub scratch_dir: PathBuf,
    /// How many times a temp file deletion is attempted
    pub delete_attempts: u32,
    /// Pause between deletion attempts
    pub delete_backoff: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            scratch_dir: PathBuf::from(SCRATCH_DIR_NAME),
            delete_attempts: 5,
            delete_backoff: Duration::from_millis(100),
        }
    }
}

impl PipelineSettings {
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }
}

/// Settings for the office suite used to convert DOCX files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficeConfig {
    /// Explicit `soffice` binary; searched for when `None`
    pub soffice_path: Option<PathBuf>,
    /// Skip probing and disable DOCX conversion
    pub disabled: bool,
    /// Upper bound for one save attempt
    pub conversion_timeout: Duration,
}

impl Default for OfficeConfig {
    fn default() -> Self {
        Self {
            soffice_path: None,
            disabled: false,
            conversion_timeout: Duration::from_secs(120),
        }
    }
}
