//! Bundle writer.
//!
//! Order of operations:
//! 1. validate every artifact path and render the manifest (no disk access)
//! 2. remove the previous manifest
//! 3. reset: delete every file below the layout's reset directories
//! 4. write each artifact, creating parent directories as needed
//! 5. write the manifest
//!
//! Each file lands through a sibling `.tmp` file and a rename, so no file is
//! ever half-written. The run as a whole is not atomic: an I/O error during
//! step 4 leaves the reset directories partly written. The manifest only
//! exists once every artifact is on disk, so a tree without one is
//! incomplete and should be regenerated.
//!
//! Files outside the reset directories are left alone unless the bundle
//! overwrites them.

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use bytesize::ByteSize;
use protowiz_core::bundle::ArtifactBundle;
use protowiz_core::config::OutputLayout;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};
use crate::manifest::build_manifest;

/// What a write did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub written: usize,
    pub removed: usize,
    pub bytes: u64,
    pub manifest_path: PathBuf,
}

impl fmt::Display for WriteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files written ({}), {} stale files removed",
            self.written,
            ByteSize::b(self.bytes),
            self.removed
        )
    }
}

fn checked_join(root: &Path, rel: &str) -> StoreResult<PathBuf> {
    let p = Path::new(rel);
    let inside = !rel.is_empty() && p.components().all(|c| matches!(c, Component::Normal(_)));
    if !inside {
        return Err(StoreError::InvalidPath(rel.to_string()));
    }
    Ok(root.join(p))
}

/// Remove every file below `dir`, keeping the directories themselves.
fn clear_files(dir: &Path) -> StoreResult<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut removed = 0usize;
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| StoreError::io(dir, e.into()))?;
        if entry.file_type().is_file() || entry.file_type().is_symlink() {
            fs::remove_file(entry.path()).map_err(|e| StoreError::io(entry.path(), e))?;
            debug!(path = %entry.path().display(), "stale file removed");
            removed += 1;
        }
    }
    Ok(removed)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_file(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    let tmp = tmp_path(path);
    fs::write(&tmp, bytes).map_err(|e| StoreError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))
}

/// Write a complete bundle under `root`.
pub fn write_bundle(
    root: &Path,
    bundle: &ArtifactBundle,
    layout: &OutputLayout,
    namespace: &str,
) -> StoreResult<WriteSummary> {
    let mut targets = Vec::with_capacity(bundle.len());
    for (rel, artifact) in bundle.iter() {
        targets.push((checked_join(root, rel)?, artifact.text.as_bytes()));
    }
    let manifest_path = checked_join(root, &layout.manifest_file)?;
    let manifest = build_manifest(bundle, namespace).to_pretty_json()?;
    let reset = layout
        .reset_dirs()
        .iter()
        .map(|d| checked_join(root, d))
        .collect::<StoreResult<Vec<_>>>()?;

    if manifest_path.is_file() {
        fs::remove_file(&manifest_path).map_err(|e| StoreError::io(&manifest_path, e))?;
    }

    let mut summary = WriteSummary {
        manifest_path: manifest_path.clone(),
        ..WriteSummary::default()
    };
    for dir in &reset {
        summary.removed += clear_files(dir)?;
    }

    for (path, bytes) in targets {
        write_file(&path, bytes)?;
        summary.written += 1;
        summary.bytes += bytes.len() as u64;
    }
    write_file(&manifest_path, manifest.as_bytes())?;

    info!(
        root = %root.display(),
        written = summary.written,
        removed = summary.removed,
        "bundle written"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use protowiz_core::bundle::ArtifactKind;

    fn bundle(schema: &str) -> ArtifactBundle {
        let mut b = ArtifactBundle::new();
        b.insert("shared/grpc.proto", ArtifactKind::Schema, schema).unwrap();
        b.insert(
            "shared/src/converters/person_converter.rs",
            ArtifactKind::Converter,
            "// person\n",
        )
        .unwrap();
        b
    }

    #[test]
    fn reset_clears_stale_converters_and_keeps_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let layout = OutputLayout::default();

        let stale = root.join("shared/src/converters/old_converter.rs");
        let nested_stale = root.join("shared/src/converters/sub/deep.rs");
        let unrelated = root.join("shared/src/lib.rs");
        write_file(&stale, b"old").unwrap();
        write_file(&nested_stale, b"old").unwrap();
        write_file(&unrelated, b"pub mod converters;\n").unwrap();
        write_file(&root.join("shared/grpc.proto"), b"previous").unwrap();

        let summary = write_bundle(root, &bundle("new schema\n"), &layout, "demo").unwrap();

        assert!(!stale.exists());
        assert!(!nested_stale.exists());
        assert!(root.join("shared/src/converters/sub").is_dir());
        assert_eq!(fs::read_to_string(&unrelated).unwrap(), "pub mod converters;\n");
        assert_eq!(
            fs::read_to_string(root.join("shared/grpc.proto")).unwrap(),
            "new schema\n"
        );
        assert_eq!(summary.written, 2);
        assert_eq!(summary.removed, 2);
        assert!(summary.manifest_path.is_file());
    }

    #[test]
    fn manifest_digests_are_stable_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::default();
        let first = write_bundle(dir.path(), &bundle("s\n"), &layout, "demo").unwrap();
        let a = fs::read(&first.manifest_path).unwrap();
        let second = write_bundle(dir.path(), &bundle("s\n"), &layout, "demo").unwrap();
        let b = fs::read(&second.manifest_path).unwrap();
        assert_eq!(a, b);

        let v: serde_json::Value = serde_json::from_slice(&a).unwrap();
        assert_eq!(v["artifacts"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn escaping_path_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut b = bundle("s\n");
        b.insert("../outside.rs", ArtifactKind::Converter, "x").unwrap();

        let err = write_bundle(dir.path(), &b, &OutputLayout::default(), "demo").unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath(_)));
        assert!(!dir.path().join("shared").exists());
    }

    #[test]
    fn failed_write_leaves_no_manifest_behind() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let layout = OutputLayout::default();
        write_bundle(root, &bundle("s\n"), &layout, "demo").unwrap();
        assert!(root.join(&layout.manifest_file).is_file());

        // A plain file where a directory is needed makes the second write fail.
        write_file(&root.join("client"), b"not a dir").unwrap();
        let mut b = bundle("s\n");
        b.insert(
            "client/src/grpc_services/people_client.rs",
            ArtifactKind::Proxy,
            "// proxy\n",
        )
        .unwrap();

        let err = write_bundle(root, &b, &layout, "demo").unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(!root.join(&layout.manifest_file).exists());
        assert!(!root.join("shared/grpc.proto.tmp").exists());
    }

    #[test]
    fn writes_leave_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), &bundle("s\n"), &OutputLayout::default(), "demo").unwrap();
        let leftovers: Vec<_> = WalkDir::new(dir.path())
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|x| x == "tmp"))
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
    }

    #[test]
    fn summary_reads_naturally() {
        let s = WriteSummary {
            written: 3,
            removed: 1,
            bytes: 10,
            manifest_path: PathBuf::new(),
        };
        let text = s.to_string();
        assert!(text.starts_with("3 files written ("));
        assert!(text.ends_with("1 stale files removed"));
    }
}
