//! Package version lookup for the setup instructions.
//!
//! Online lookups read `crate.max_stable_version` from the crates.io API.
//! `--offline` uses a pinned table instead. A failed lookup is reported as a
//! [`VersionError`] and stops the run before anything is written.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Packages referenced by the setup instructions.
pub const PACKAGES: &[&str] = &[
    "async-trait",
    "chrono",
    "prost",
    "rust_decimal",
    "tokio",
    "tonic",
    "tonic-build",
];

const CRATES_IO: &str = "https://crates.io";

const PINNED: &[(&str, &str)] = &[
    ("async-trait", "0.1"),
    ("chrono", "0.4"),
    ("prost", "0.13"),
    ("rust_decimal", "1"),
    ("tokio", "1"),
    ("tonic", "0.12"),
    ("tonic-build", "0.12"),
];

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("version lookup for {package} timed out")]
    Timeout { package: String },

    #[error("version lookup for {package} failed with HTTP {status}")]
    Status { package: String, status: u16 },

    #[error("version lookup for {package} failed: {message}")]
    Transport { package: String, message: String },

    #[error("unexpected crates.io response for {package}: {message}")]
    Decode { package: String, message: String },

    #[error("no pinned version for {0}")]
    Unpinned(String),
}

#[async_trait]
pub trait VersionSource: Send + Sync {
    async fn latest(&self, package: &str) -> Result<String, VersionError>;
}

/// Offline fallback table.
#[derive(Debug, Default, Clone, Copy)]
pub struct PinnedVersions;

#[async_trait]
impl VersionSource for PinnedVersions {
    async fn latest(&self, package: &str) -> Result<String, VersionError> {
        PINNED
            .iter()
            .find(|(name, _)| *name == package)
            .map(|(_, v)| v.to_string())
            .ok_or_else(|| VersionError::Unpinned(package.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct CrateResponse {
    #[serde(rename = "crate")]
    krate: CrateInfo,
}

#[derive(Debug, Deserialize)]
struct CrateInfo {
    max_stable_version: Option<String>,
    max_version: String,
}

fn parse_crate_response(package: &str, body: &str) -> Result<String, VersionError> {
    let resp: CrateResponse = serde_json::from_str(body).map_err(|e| VersionError::Decode {
        package: package.to_string(),
        message: e.to_string(),
    })?;
    Ok(resp
        .krate
        .max_stable_version
        .unwrap_or(resp.krate.max_version))
}

/// crates.io API client.
#[derive(Debug, Clone)]
pub struct CratesIoVersions {
    client: reqwest::Client,
    base_url: String,
}

impl CratesIoVersions {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("protowiz/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: CRATES_IO.to_string(),
        })
    }

    fn transport_error(package: &str, e: reqwest::Error) -> VersionError {
        if e.is_timeout() {
            VersionError::Timeout {
                package: package.to_string(),
            }
        } else {
            VersionError::Transport {
                package: package.to_string(),
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl VersionSource for CratesIoVersions {
    async fn latest(&self, package: &str) -> Result<String, VersionError> {
        let url = format!("{}/api/v1/crates/{package}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::transport_error(package, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(VersionError::Status {
                package: package.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Self::transport_error(package, e))?;
        let version = parse_crate_response(package, &body)?;
        debug!(package, version = %version, "version resolved");
        Ok(version)
    }
}

/// Look up every package in [`PACKAGES`].
pub async fn resolve_versions(
    source: &dyn VersionSource,
) -> Result<BTreeMap<String, String>, VersionError> {
    let mut out = BTreeMap::new();
    for package in PACKAGES {
        out.insert(package.to_string(), source.latest(package).await?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pinned_table_covers_every_package() {
        let versions = resolve_versions(&PinnedVersions).await.unwrap();
        assert_eq!(versions.len(), PACKAGES.len());
        assert_eq!(versions["tonic"], "0.12");
    }

    #[tokio::test]
    async fn unknown_package_is_not_pinned() {
        let err = PinnedVersions.latest("left-pad").await.unwrap_err();
        assert!(matches!(err, VersionError::Unpinned(_)));
    }

    #[test]
    fn prefers_max_stable_version() {
        let body = r#"{"crate":{"name":"tonic","max_version":"0.13.0-alpha.1","max_stable_version":"0.12.3"}}"#;
        assert_eq!(parse_crate_response("tonic", body).unwrap(), "0.12.3");
    }

    #[test]
    fn falls_back_to_max_version() {
        let body = r#"{"crate":{"max_version":"1.0.0","max_stable_version":null}}"#;
        assert_eq!(parse_crate_response("x", body).unwrap(), "1.0.0");
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let err = parse_crate_response("tonic", "{}").unwrap_err();
        assert!(matches!(err, VersionError::Decode { .. }));
    }
}
