//! Gzipped tarball extraction

use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::{Archive, EntryType};

/// Errors raised while decompressing an archive
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("failed to decompress source file: {0}")]
    Io(#[from] io::Error),

    #[error("archive entry escapes destination: {0}")]
    UnsafePath(PathBuf),
}

/// Extract a `.tar.gz` stream into `dest`, dropping `strip_components`
/// leading path components from every entry.
///
/// Entries left with an empty path after stripping are skipped. An entry
/// whose parent directory resolves outside `dest`, for instance through a
/// symlink extracted earlier, is rejected. Returns the number of entries
/// written.
pub fn extract_tar_gz<R: Read>(
    reader: R,
    dest: &Path,
    strip_components: usize,
) -> Result<usize, ArchiveError> {
    let mut archive = Archive::new(GzDecoder::new(reader));
    let root = dest.canonicalize()?;
    let mut extracted = 0;

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();

        let stripped: PathBuf = path
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .skip(strip_components)
            .collect();
        if stripped.as_os_str().is_empty() {
            continue;
        }
        if stripped
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(ArchiveError::UnsafePath(path));
        }

        // Hard link targets are archive-relative and do not survive stripping.
        if entry.header().entry_type() == EntryType::Link {
            tracing::debug!(path = %path.display(), "skipping hard link");
            continue;
        }

        let target = dest.join(&stripped);
        if let Some(parent) = target.parent() {
            if !resolves_within(&root, parent)? {
                return Err(ArchiveError::UnsafePath(path));
            }
            fs::create_dir_all(parent)?;
        }
        entry.unpack(&target)?;
        extracted += 1;
    }

    tracing::debug!(dest = %dest.display(), entries = extracted, "archive extracted");
    Ok(extracted)
}

/// Whether `dir`, or its deepest existing ancestor, resolves inside `root`.
fn resolves_within(root: &Path, dir: &Path) -> io::Result<bool> {
    let mut existing = dir;
    while fs::symlink_metadata(existing).is_err() {
        match existing.parent() {
            Some(parent) => existing = parent,
            None => return Ok(false),
        }
    }
    Ok(existing.canonicalize()?.starts_with(root))
}
