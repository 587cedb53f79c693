//! Scratch directory for intermediate conversion artifacts
//!
//! Every artifact created during a merge is tracked here and deleted when
//! the job ends, whether it succeeded or not. Deletion is retried a few
//! times because the office suite or the OS may hold a file handle slightly
//! past the end of a conversion.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::PipelineSettings;
use crate::error::{Error, Result};

/// Job-scoped temporary storage
#[derive(Debug)]
pub struct ScratchSpace {
    dir: PathBuf,
    tracked: Vec<PathBuf>,
    delete_attempts: u32,
    delete_backoff: Duration,
}

impl ScratchSpace {
    pub fn new(settings: &PipelineSettings) -> Self {
        Self {
            dir: settings.scratch_dir.clone(),
            tracked: Vec::new(),
            delete_attempts: settings.delete_attempts.max(1),
            delete_backoff: settings.delete_backoff,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the scratch directory if needed
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Reserve `name` inside the scratch directory and track it for cleanup
    pub fn track(&mut self, name: &str) -> PathBuf {
        let path = self.dir.join(name);
        if !self.tracked.contains(&path) {
            self.tracked.push(path.clone());
        }
        path
    }

    pub fn tracked(&self) -> &[PathBuf] {
        &self.tracked
    }

    /// Delete every tracked artifact.
    ///
    /// Returns one `DeleteRetryExhausted` per file that survived all
    /// attempts. Files that are already gone count as deleted.
    pub fn purge(&mut self) -> Vec<Error> {
        let mut failures = Vec::new();
        for path in self.tracked.drain(..) {
            match remove_with_retry(&path, self.delete_attempts, self.delete_backoff) {
                Ok(true) => debug!("Deleted temp file: {}", path.display()),
                Ok(false) => {}
                Err(err) => {
                    warn!("{}", err);
                    failures.push(err);
                }
            }
        }
        failures
    }
}

/// Remove `path`, retrying on failure. Returns whether a file was removed.
fn remove_with_retry(path: &Path, attempts: u32, backoff: Duration) -> Result<bool> {
    for attempt in 1..=attempts {
        match fs::remove_file(path) {
            Ok(()) => return Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                debug!(
                    "Attempt {}/{} to delete {} failed: {}",
                    attempt,
                    attempts,
                    path.display(),
                    e
                );
                if attempt < attempts {
                    thread::sleep(backoff);
                }
            }
        }
    }

    Err(Error::DeleteRetryExhausted {
        path: path.to_path_buf(),
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn settings(dir: &Path) -> PipelineSettings {
        PipelineSettings {
            scratch_dir: dir.join("temp_split"),
            delete_attempts: 5,
            delete_backoff: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_track_is_inside_scratch_dir() {
        let temp_dir = TempDir::new().unwrap();
        let mut scratch = ScratchSpace::new(&settings(temp_dir.path()));

        let path = scratch.track("temp_txt_0.pdf");
        assert_eq!(path, temp_dir.path().join("temp_split").join("temp_txt_0.pdf"));

        // Tracking the same name twice records it once
        scratch.track("temp_txt_0.pdf");
        assert_eq!(scratch.tracked().len(), 1);
    }

    #[test]
    fn test_purge_removes_files_and_ignores_missing() {
        let temp_dir = TempDir::new().unwrap();
        let mut scratch = ScratchSpace::new(&settings(temp_dir.path()));
        scratch.ensure_dir().unwrap();

        let written = scratch.track("a.pdf");
        fs::write(&written, b"x").unwrap();
        scratch.track("never-created.pdf");

        assert!(scratch.purge().is_empty());
        assert!(!written.exists());
        assert!(scratch.tracked().is_empty());
        assert_eq!(fs::read_dir(scratch.dir()).unwrap().count(), 0);
    }

    #[test]
    fn test_purge_reports_undeletable() {
        let temp_dir = TempDir::new().unwrap();
        let mut scratch = ScratchSpace::new(&settings(temp_dir.path()));
        scratch.ensure_dir().unwrap();

        // remove_file refuses directories, so this survives every attempt
        let stuck = scratch.track("stuck.pdf");
        fs::create_dir(&stuck).unwrap();
        fs::write(stuck.join("inner"), b"x").unwrap();

        let failures = scratch.purge();
        assert_eq!(failures.len(), 1);
        assert!(matches!(
            &failures[0],
            Error::DeleteRetryExhausted { attempts: 5, .. }
        ));
    }
}
