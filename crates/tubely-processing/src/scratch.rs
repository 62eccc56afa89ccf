//! Scratch files owned by one pipeline invocation.

use std::io;
use std::path::{Path, PathBuf};

/// A file on local disk that is removed when the guard drops.
///
/// Dropping happens on every exit path of the owning call, including early
/// returns through `?` and task cancellation.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Create a uniquely named empty file in `dir` and open it for writing.
    pub fn create(dir: &Path, prefix: &str) -> io::Result<(Self, tokio::fs::File)> {
        let named = tempfile::Builder::new().prefix(prefix).tempfile_in(dir)?;
        let (file, path) = named.keep().map_err(|e| e.error)?;
        Ok((Self { path }, tokio::fs::File::from_std(file)))
    }

    /// Take ownership of a path another process is about to write.
    pub fn adopt(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::trace!(path = %self.path.display(), "Scratch file removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                error = %e,
                path = %self.path.display(),
                "Failed to remove scratch file"
            ),
        }
    }
}
