//! Sysfs LED indicator.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// LED driven through its sysfs `brightness` file.
#[derive(Debug, Clone)]
pub struct LedIndicator {
    path: PathBuf,
}

impl LedIndicator {
    /// Create an indicator for the given brightness file.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the brightness file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Switch the LED. Failures are logged, never returned.
    pub fn set(&self, on: bool) {
        let value: &[u8] = if on { b"255" } else { b"0" };

        // The file must already exist; sysfs attributes are never created.
        let result = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(value));

        match result {
            Ok(()) => tracing::debug!(on, path = %self.path.display(), "led set"),
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "failed to set led"),
        }
    }
}
