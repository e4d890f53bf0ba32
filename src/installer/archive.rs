//! `.tar.xz` extraction.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Unpack a `.tar.xz` archive into `dest`, keeping file modes.
///
/// Entries that would escape `dest` (absolute paths, `..`) are skipped by `tar`.
///
/// # Errors
///
/// Returns an error if the archive cannot be opened, is not valid xz/tar, or an entry cannot
/// be written.
pub fn extract_tar_xz(archive: &Path, dest: &Path) -> Result<()> {
    let file =
        File::open(archive).with_context(|| format!("Failed to open {}", archive.display()))?;
    let decoder = xz2::read::XzDecoder::new(file);

    let mut tarball = tar::Archive::new(decoder);
    tarball.set_preserve_permissions(true);
    tarball.set_overwrite(true);
    tarball
        .unpack(dest)
        .with_context(|| format!("Failed to extract {} into {}", archive.display(), dest.display()))
}

/// [`extract_tar_xz`] on the blocking pool.
///
/// # Errors
///
/// Same as [`extract_tar_xz`].
pub async fn extract(archive: &Path, dest: &Path) -> Result<()> {
    let (archive, dest): (PathBuf, PathBuf) = (archive.to_path_buf(), dest.to_path_buf());
    tokio::task::spawn_blocking(move || extract_tar_xz(&archive, &dest))
        .await
        .context("Failed to spawn blocking task for extraction")?
}
