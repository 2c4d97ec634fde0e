//! Deterministic collaborators for unit tests

use crate::buildpack::RemoteBuildpack;
use crate::error::{FreezerError, FreezerResult};
use crate::fetch::{ArtifactTransport, PackagingTool, UnpackedArtifact};
use crate::release::{ReleaseAsset, ReleaseMetadata, ReleaseSource};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;

/// Release source returning a fixed release and counting queries
pub struct StubReleases {
    tag: String,
    assets: Vec<ReleaseAsset>,
    fail_with: Mutex<Option<FreezerError>>,
    calls: Arc<AtomicUsize>,
}

impl StubReleases {
    pub fn new(tag: &str, assets: &[&str]) -> Self {
        Self {
            tag: tag.to_string(),
            assets: assets
                .iter()
                .map(|name| ReleaseAsset {
                    name: name.to_string(),
                    download_url: format!("https://example.com/{}", name),
                    size: 0,
                    digest: None,
                })
                .collect(),
            fail_with: Mutex::new(None),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail the first query with `err`
    pub fn failing(err: FreezerError) -> Self {
        let stub = Self::new("v0.0.0", &[]);
        *stub.fail_with.lock().unwrap() = Some(err);
        stub
    }

    /// Share the query counter with another stub
    pub fn with_counter(mut self, calls: Arc<AtomicUsize>) -> Self {
        self.calls = calls;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReleaseSource for StubReleases {
    async fn query(&self, _buildpack: &RemoteBuildpack) -> FreezerResult<ReleaseMetadata> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail_with.lock().unwrap().take() {
            return Err(err);
        }
        Ok(ReleaseMetadata::new(self.tag.clone(), self.assets.clone()))
    }
}

/// Transport writing a fixed payload instead of downloading
#[derive(Default)]
pub struct StubTransport {
    pub fail: bool,
    calls: Arc<AtomicUsize>,
}

impl StubTransport {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn with_counter(mut self, calls: Arc<AtomicUsize>) -> Self {
        self.calls = calls;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactTransport for StubTransport {
    async fn download(&self, asset: &ReleaseAsset, dest_dir: &Path) -> FreezerResult<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(FreezerError::download(&asset.download_url, "connection reset"));
        }
        let path = dest_dir.join(&asset.name);
        std::fs::write(&path, b"archive-bytes").unwrap();
        Ok(path)
    }
}

/// Packaging tool that "unpacks" by writing a buildpack.toml
#[derive(Default)]
pub struct StubPackager {
    pub fail: bool,
    gate: Option<Arc<Barrier>>,
}

impl StubPackager {
    pub fn failing() -> Self {
        Self {
            fail: true,
            gate: None,
        }
    }

    /// Hold every unpack until `gate` has been reached by all its parties
    pub fn gated(gate: Arc<Barrier>) -> Self {
        Self {
            fail: false,
            gate: Some(gate),
        }
    }
}

#[async_trait]
impl PackagingTool for StubPackager {
    async fn unpack(
        &self,
        archive: &Path,
        _expected_sha256: Option<&str>,
        dest: &Path,
    ) -> FreezerResult<UnpackedArtifact> {
        if self.fail {
            return Err(FreezerError::unpack(archive, "bad gzip header"));
        }
        std::fs::write(dest.join("buildpack.toml"), "api = \"0.2\"").unwrap();
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        Ok(UnpackedArtifact {
            dir: dest.to_path_buf(),
            sha256: "ab".repeat(32),
        })
    }
}
