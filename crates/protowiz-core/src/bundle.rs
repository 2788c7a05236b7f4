//! In-memory artifact bundle.
//!
//! Every generated file of a run is staged here first. Nothing is written to
//! disk until the bundle is complete.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::errors::{ProtowizError, ProtowizResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Schema,
    Converter,
    ConverterIndex,
    Adapter,
    AdapterIndex,
    Proxy,
    ProxyIndex,
    Instructions,
    CopiedSource,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Converter => "converter",
            Self::ConverterIndex => "converter_index",
            Self::Adapter => "adapter",
            Self::AdapterIndex => "adapter_index",
            Self::Proxy => "proxy",
            Self::ProxyIndex => "proxy_index",
            Self::Instructions => "instructions",
            Self::CopiedSource => "copied_source",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub text: String,
}

/// Relative path -> artifact, ordered by path.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArtifactBundle {
    artifacts: BTreeMap<String, Artifact>,
}

impl ArtifactBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an artifact. Two artifacts may not share a path.
    pub fn insert(
        &mut self,
        path: impl Into<String>,
        kind: ArtifactKind,
        text: impl Into<String>,
    ) -> ProtowizResult<()> {
        let path = path.into();
        if self.artifacts.contains_key(&path) {
            return Err(ProtowizError::invariant(format!(
                "two artifacts staged at {path}"
            )));
        }
        self.artifacts.insert(
            path,
            Artifact {
                kind,
                text: text.into(),
            },
        );
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&Artifact> {
        self.artifacts.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Artifact)> {
        self.artifacts.iter().map(|(p, a)| (p.as_str(), a))
    }

    /// Paths of every artifact of one kind.
    pub fn paths_of(&self, kind: ArtifactKind) -> impl Iterator<Item = &str> {
        self.iter().filter(move |(_, a)| a.kind == kind).map(|(p, _)| p)
    }

    pub fn count(&self, kind: ArtifactKind) -> usize {
        self.paths_of(kind).count()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Total size of staged text in bytes.
    pub fn total_bytes(&self) -> usize {
        self.artifacts.values().map(|a| a.text.len()).sum()
    }
}
