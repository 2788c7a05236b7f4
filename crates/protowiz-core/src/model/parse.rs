//! Descriptor file parsing.
//!
//! A descriptor file is the declarative form of a [`Registry`]. It is JSON:
//!
//! ```json
//! {
//!   "version": "v1",
//!   "config": { "namespace": "people_demo" },
//!   "models": [
//!     { "name": "Person", "marked": true,
//!       "fields": [ { "name": "id", "type": "int32" } ] }
//!   ],
//!   "services": [
//!     { "name": "PeopleService", "models": ["Person"],
//!       "interfaces": [ { "name": "PeopleApi", "methods": [
//!         { "name": "get_all", "params": ["GetAllPeopleRequest"],
//!           "returns": { "async": "PeopleResponse" } } ] } ] }
//!   ]
//! }
//! ```
//!
//! Parsing is deterministic given the same bytes and enforces an explicit
//! size limit supplied by the caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Registry;
use crate::config::GeneratorConfig;
use crate::errors::{ProtowizError, ProtowizResult};

/// Default maximum descriptor size accepted by helpers (2 MiB).
pub const DEFAULT_MAX_DESCRIPTOR_BYTES: usize = 2 * 1024 * 1024;

/// The only descriptor format version understood by this crate.
pub const DESCRIPTOR_VERSION_V1: &str = "v1";

/// A parsed descriptor file: a registry plus optional generator settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescriptorFile {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub config: Option<GeneratorConfig>,
    #[serde(flatten)]
    pub registry: Registry,
}

fn default_version() -> String {
    DESCRIPTOR_VERSION_V1.to_string()
}

/// Parse JSON bytes into `serde_json::Value` with a hard size limit.
pub fn parse_json_bytes(bytes: &[u8], max_bytes: usize) -> ProtowizResult<Value> {
    if bytes.len() > max_bytes {
        return Err(ProtowizError::invalid_argument(format!(
            "descriptor too large ({} bytes > limit {})",
            bytes.len(),
            max_bytes
        )));
    }

    serde_json::from_slice(bytes)
        .map_err(|e| ProtowizError::serialization(format!("failed to parse JSON: {e}")))
}

/// Parse descriptor bytes.
pub fn parse_descriptor(bytes: &[u8], max_bytes: usize) -> ProtowizResult<DescriptorFile> {
    let v = parse_json_bytes(bytes, max_bytes)?;
    if !v.is_object() {
        return Err(ProtowizError::invalid_argument("descriptor must be a JSON object"));
    }

    let file: DescriptorFile = serde_json::from_value(v)
        .map_err(|e| ProtowizError::serialization(format!("failed to decode descriptor: {e}")))?;

    if file.version != DESCRIPTOR_VERSION_V1 {
        return Err(ProtowizError::invalid_argument(format!(
            "unsupported descriptor version: {}",
            file.version
        )));
    }

    Ok(file)
}

impl Registry {
    /// Parse a registry from descriptor bytes, ignoring any `config` section.
    pub fn from_json_bytes(bytes: &[u8]) -> ProtowizResult<Self> {
        Ok(parse_descriptor(bytes, DEFAULT_MAX_DESCRIPTOR_BYTES)?.registry)
    }

    pub fn from_json_str(s: &str) -> ProtowizResult<Self> {
        Self::from_json_bytes(s.as_bytes())
    }
}
