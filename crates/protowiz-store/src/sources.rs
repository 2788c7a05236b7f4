//! Copying user sources into the bundle.
//!
//! Walks a source directory in sorted order, takes every `.rs` file, strips
//! protowiz markers and stages the result as a `CopiedSource` artifact under
//! the destination directory, keeping the relative layout.

use std::fs;
use std::path::Path;

use protowiz_core::bundle::{ArtifactBundle, ArtifactKind};
use protowiz_core::defaults::MAX_SOURCE_BYTES;
use protowiz_core::emit::join_path;
use protowiz_core::sources::prepare_source;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};

fn relative_slash_path(root: &Path, path: &Path) -> StoreResult<String> {
    let rel = path
        .strip_prefix(root)
        .map_err(|_| StoreError::InvalidPath(path.display().to_string()))?;
    let parts = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    Ok(parts.join("/"))
}

/// Stage every `.rs` file under `src_dir` at `dest_dir/<relative path>`.
///
/// Returns the number of files staged. A missing `src_dir` is an error; an
/// empty one stages nothing.
pub fn collect_sources(
    src_dir: &Path,
    dest_dir: &str,
    bundle: &mut ArtifactBundle,
) -> StoreResult<usize> {
    if !src_dir.is_dir() {
        return Err(StoreError::io(
            src_dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "source directory not found"),
        ));
    }

    let mut staged = 0usize;
    for entry in WalkDir::new(src_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src_dir).to_path_buf();
            StoreError::io(path, e.into())
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|x| x.to_str()) != Some("rs") {
            continue;
        }

        let raw = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        let text = prepare_source(&raw, MAX_SOURCE_BYTES)?;
        let rel = relative_slash_path(src_dir, path)?;
        bundle.insert(join_path(dest_dir, &rel), ArtifactKind::CopiedSource, text)?;
        debug!(source = %path.display(), "source staged");
        staged += 1;
    }
    Ok(staged)
}
