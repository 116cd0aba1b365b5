//! Filesystem utilities.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tempfile::NamedTempFile;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Symlink hops followed before giving up, matching Linux's ELOOP limit.
const MAX_SYMLINK_HOPS: usize = 40;

/// Follow `path` through any symlinks to the file they point at.
///
/// Unlike `fs::canonicalize`, the final file does not have to exist, so a
/// dangling link resolves to the path it would create.
pub fn follow_symlinks(path: &Path) -> Result<PathBuf> {
    let mut current = path.to_path_buf();
    for _ in 0..MAX_SYMLINK_HOPS {
        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                let link = fs::read_link(&current)
                    .with_context(|| format!("failed to read link: {}", current.display()))?;
                current = match current.parent() {
                    Some(parent) => parent.join(link),
                    None => link,
                };
            }
            _ => return Ok(current),
        }
    }
    bail!("too many levels of symbolic links: {}", path.display())
}

/// Copy `src` over `dst`, replacing it atomically.
///
/// The bytes are written to a temporary file next to `dst` and renamed into
/// place, so `dst` is either the old file or the complete new one. If `dst`
/// is a symlink the file it points at is replaced and the link is kept. The
/// source's permission bits are carried over. Returns the bytes copied.
pub fn atomic_copy(src: &Path, dst: &Path) -> Result<u64> {
    let dst = follow_symlinks(dst)?;
    let dst = dst.as_path();

    let permissions = fs::metadata(src)
        .with_context(|| format!("failed to read file: {}", src.display()))?
        .permissions();

    let parent = match dst.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    let mut reader =
        File::open(src).with_context(|| format!("failed to open file: {}", src.display()))?;
    let mut tmp = NamedTempFile::new_in(parent).with_context(|| {
        format!("failed to create temporary file in: {}", parent.display())
    })?;

    let copied = io::copy(&mut reader, tmp.as_file_mut()).with_context(|| {
        format!("failed to copy {} to {}", src.display(), tmp.path().display())
    })?;
    tmp.as_file()
        .set_permissions(permissions)
        .with_context(|| format!("failed to set permissions on {}", tmp.path().display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("failed to flush {}", tmp.path().display()))?;

    tmp.persist(dst)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to replace {}", dst.display()))?;

    Ok(copied)
}

/// Size of a file in bytes.
pub fn file_size(path: &Path) -> Result<u64> {
    let meta = fs::metadata(path)
        .with_context(|| format!("failed to read file: {}", path.display()))?;
    Ok(meta.len())
}
