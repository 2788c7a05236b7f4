//! Generation manifest.
//!
//! The manifest lists every artifact of a run with its size and sha256
//! digest. It carries no timestamps, so an unchanged registry produces an
//! identical manifest. It is informational and never read back by the core.

use protowiz_core::bundle::ArtifactBundle;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{StoreError, StoreResult};

pub const MANIFEST_VERSION: &str = "v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    pub kind: String,
    pub bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationManifest {
    pub version: String,
    pub generator_version: String,
    pub namespace: String,
    pub artifacts: Vec<ManifestEntry>,
}

impl GenerationManifest {
    pub fn to_pretty_json(&self) -> StoreResult<String> {
        let mut s = serde_json::to_string_pretty(self)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        s.push('\n');
        Ok(s)
    }
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

/// Build the manifest for a bundle, in bundle path order.
pub fn build_manifest(bundle: &ArtifactBundle, namespace: &str) -> GenerationManifest {
    let artifacts = bundle
        .iter()
        .map(|(path, artifact)| ManifestEntry {
            path: path.to_string(),
            kind: artifact.kind.as_str().to_string(),
            bytes: artifact.text.len() as u64,
            sha256: sha256_hex(artifact.text.as_bytes()),
        })
        .collect();

    GenerationManifest {
        version: MANIFEST_VERSION.to_string(),
        generator_version: env!("CARGO_PKG_VERSION").to_string(),
        namespace: namespace.to_string(),
        artifacts,
    }
}
