//! protowiz-store
//!
//! Filesystem side of a generation run:
//! - copy user model/service sources into a bundle with markers stripped
//! - write a staged bundle under an output root with directory reset
//! - record a manifest of every written artifact with its sha256 digest
//!
//! Nothing here decides *what* to generate. The core hands over a complete
//! [`protowiz_core::bundle::ArtifactBundle`] and the store only persists it.

pub mod error;
pub mod manifest;
pub mod sources;
pub mod writer;

pub use crate::error::{StoreError, StoreResult};
pub use crate::manifest::{build_manifest, GenerationManifest, ManifestEntry, MANIFEST_VERSION};
pub use crate::sources::collect_sources;
pub use crate::writer::{write_bundle, WriteSummary};
