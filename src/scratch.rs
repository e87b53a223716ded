//! Scratch directories for uploads and generated certificates.
//!
//! Directories created here are not removed when the process exits, so that
//! uploaded files and the certificate stay available afterwards.

use std::io;
use std::path::{Path, PathBuf};

/// Prefix of every scratch directory name.
pub const SCRATCH_PREFIX: &str = "dropafile-";

/// Create a new, empty directory below the system temp dir.
pub fn create_scratch_dir() -> io::Result<PathBuf> {
    let dir = tempfile::Builder::new().prefix(SCRATCH_PREFIX).tempdir()?;
    Ok(dir.keep())
}

/// Use `supplied` if given (creating it when missing), otherwise a new
/// scratch directory. The returned path is absolute.
pub fn prepare_dir(supplied: Option<&Path>) -> io::Result<PathBuf> {
    match supplied {
        Some(path) => {
            std::fs::create_dir_all(path)?;
            path.canonicalize()
        }
        None => create_scratch_dir(),
    }
}
