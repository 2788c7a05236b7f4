//! Configuration structures for protowiz-core.
//!
//! This module defines explicit, serializable configuration objects that
//! control naming, the crate paths referenced by generated code, and the
//! output layout.
//!
//! The core crate itself does not read environment variables. All
//! configuration must be provided explicitly by the caller so that the same
//! registry and config always produce the same artifacts.

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::errors::{ProtowizError, ProtowizResult};
use crate::naming::is_identifier;

/// Global configuration container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Proto package of the emitted schema; also the `include_proto!` name.
    pub namespace: String,
    pub naming: NamingConfig,
    pub crates: CratePaths,
    pub layout: OutputLayout,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            namespace: crate::defaults::NAMESPACE.to_string(),
            naming: NamingConfig::default(),
            crates: CratePaths::default(),
            layout: OutputLayout::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

/// Naming rules applied to generated identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Prefix of every wire message and wire service name.
    pub wire_prefix: String,
    /// Required suffix of service type names; stripped to form the short name.
    pub service_suffix: String,
    /// Prefix of timestamp wire fields.
    pub timestamp_prefix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            wire_prefix: "Grpc".to_string(),
            service_suffix: "Service".to_string(),
            timestamp_prefix: "dt_".to_string(),
        }
    }
}

/// Rust paths the generated code uses to reach domain and wire types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CratePaths {
    /// Crate holding models, wire types and converters, as seen from server/client.
    pub shared_crate: String,
    /// Module of the shared crate holding the domain models.
    pub models_module: String,
    /// Module of the shared crate holding the prost/tonic output.
    pub wire_module: String,
    /// Module of the shared crate holding converters.
    pub converters_module: String,
    /// Module of the server crate holding domain service traits.
    pub services_module: String,
}

impl Default for CratePaths {
    fn default() -> Self {
        Self {
            shared_crate: "shared".to_string(),
            models_module: "models".to_string(),
            wire_module: "wire".to_string(),
            converters_module: "converters".to_string(),
            services_module: "services".to_string(),
        }
    }
}

/// Relative locations of generated artifacts under the output root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputLayout {
    pub schema_file: String,
    pub converters_dir: String,
    pub models_dir: String,
    pub adapters_dir: String,
    pub services_dir: String,
    pub proxies_dir: String,
    pub instructions_file: String,
    pub manifest_file: String,
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self {
            schema_file: "shared/grpc.proto".to_string(),
            converters_dir: "shared/src/converters".to_string(),
            models_dir: "shared/src/models".to_string(),
            adapters_dir: "server/src/grpc_services".to_string(),
            services_dir: "server/src/services".to_string(),
            proxies_dir: "client/src/grpc_services".to_string(),
            instructions_file: "README.txt".to_string(),
            manifest_file: ".protowiz/manifest.json".to_string(),
        }
    }
}

impl OutputLayout {
    /// Directories whose files are fully cleared before each write.
    pub fn reset_dirs(&self) -> [&str; 4] {
        [
            self.converters_dir.as_str(),
            self.adapters_dir.as_str(),
            self.proxies_dir.as_str(),
            self.models_dir.as_str(),
        ]
    }

    fn all_paths(&self) -> [(&'static str, &str); 8] {
        [
            ("schema_file", self.schema_file.as_str()),
            ("converters_dir", self.converters_dir.as_str()),
            ("models_dir", self.models_dir.as_str()),
            ("adapters_dir", self.adapters_dir.as_str()),
            ("services_dir", self.services_dir.as_str()),
            ("proxies_dir", self.proxies_dir.as_str()),
            ("instructions_file", self.instructions_file.as_str()),
            ("manifest_file", self.manifest_file.as_str()),
        ]
    }
}

/// Validate a full configuration object.
pub fn validate_config(cfg: &GeneratorConfig) -> ProtowizResult<()> {
    if cfg.namespace.is_empty() || !cfg.namespace.split('.').all(is_identifier) {
        return Err(ProtowizError::invalid_argument(format!(
            "namespace must be a dotted identifier: {:?}",
            cfg.namespace
        )));
    }

    if !is_identifier(&cfg.naming.wire_prefix) {
        return Err(ProtowizError::invalid_argument(
            "wire_prefix must be a non-empty identifier",
        ));
    }

    if cfg.naming.service_suffix.is_empty() {
        return Err(ProtowizError::invalid_argument(
            "service_suffix must not be empty",
        ));
    }

    if !cfg.naming.timestamp_prefix.is_empty() && !is_identifier(&cfg.naming.timestamp_prefix) {
        return Err(ProtowizError::invalid_argument(
            "timestamp_prefix must be an identifier fragment",
        ));
    }

    for (label, path) in [
        ("shared_crate", &cfg.crates.shared_crate),
        ("models_module", &cfg.crates.models_module),
        ("wire_module", &cfg.crates.wire_module),
        ("converters_module", &cfg.crates.converters_module),
        ("services_module", &cfg.crates.services_module),
    ] {
        if !is_identifier(path) {
            return Err(ProtowizError::invalid_argument(format!(
                "{label} must be a Rust identifier: {path:?}"
            )));
        }
    }

    for (label, path) in cfg.layout.all_paths() {
        let p = Path::new(path);
        let relative_and_inside = !path.is_empty()
            && p.components().all(|c| matches!(c, Component::Normal(_)));
        if !relative_and_inside {
            return Err(ProtowizError::invalid_argument(format!(
                "{label} must be a relative path inside the output root: {path:?}"
            )));
        }
    }

    Ok(())
}
