use crate::error::{ErrorKind, Result};
use std::path::{Path, PathBuf};

/// Executable names searched for in `PATH`, in order of preference.
// TODO: What are the executable names on Windows? macOS?
const EXECUTABLES: [&str; 5] = ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser", "chrome"];

/// Represents a Chrome/Chromium executable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chrome {
    path: PathBuf,
}
impl Chrome {
    pub(crate) fn discover() -> Result<Self> {
        for exe in EXECUTABLES {
            if let Ok(path) = which::which(exe) {
                tracing::debug!(chrome = %path.display(), "Discovered Chrome executable in PATH");
                return Ok(Self { path });
            }
        }
        tracing::info!("Chrome executable not found in PATH");
        exn::bail!(ErrorKind::ChromeNotFound);
    }

    /// Use an explicitly configured executable. Bare names are resolved
    /// against `PATH`; paths are taken as-is and checked at launch.
    pub(crate) fn at(executable: impl AsRef<Path>) -> Self {
        let executable = executable.as_ref();
        let path = if executable.components().count() == 1 {
            which::which(executable).unwrap_or_else(|_| executable.to_path_buf())
        } else {
            executable.to_path_buf()
        };
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
