use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

/// Write `content` to `dir/filename` and return the written path. The
/// terminal stand-in for a browser download: `mime` is carried through the
/// effect for contract parity but a file on disk has no use for it.
pub fn download_string(dir: &Path, filename: &str, mime: &str, content: &str) -> Result<PathBuf> {
    let path = dir.join(filename);
    debug!("exporting {} bytes ({mime}) to {}", content.len(), path.display());
    fs::write(&path, content)?;
    Ok(path)
}
