//! Artifact transport
//!
//! Downloads the bytes of a release asset into a directory.

use crate::creds::GithubToken;
use crate::error::{FreezerError, FreezerResult};
use crate::release::github::http_agent;
use crate::release::ReleaseAsset;
use async_trait::async_trait;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name used when an asset name is unusable as a path component
const FALLBACK_FILE_NAME: &str = "artifact.tgz";

/// Downloads release assets
#[async_trait]
pub trait ArtifactTransport: Send + Sync {
    /// Download `asset` into `dest_dir`, returning the written file
    async fn download(&self, asset: &ReleaseAsset, dest_dir: &Path) -> FreezerResult<PathBuf>;
}

/// HTTP transport for GitHub release downloads
///
/// The token is attached to the first request only; `ureq` drops auth
/// headers when following the redirect to GitHub's object storage.
#[derive(Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
    token: Option<GithubToken>,
}

impl HttpTransport {
    pub fn new(token: Option<GithubToken>) -> Self {
        Self {
            agent: http_agent(),
            token,
        }
    }

    fn download_blocking(&self, asset: &ReleaseAsset, dest_dir: &Path) -> FreezerResult<PathBuf> {
        let url = asset.download_url.as_str();
        debug!("Downloading {}", url);

        let mut request = self
            .agent
            .get(url)
            .header("Accept", "application/octet-stream");
        if let Some(token) = &self.token {
            request = request.header("Authorization", token.authorization_header());
        }

        let mut response = request
            .call()
            .map_err(|e| FreezerError::download(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FreezerError::download(url, format!("HTTP {}", status.as_u16())));
        }

        let dest = dest_dir.join(asset_file_name(&asset.name));
        let file = File::create(&dest)
            .map_err(|e| FreezerError::download(url, format!("creating {}: {}", dest.display(), e)))?;
        let mut writer = BufWriter::new(file);

        let mut reader = response.body_mut().as_reader();
        let written = std::io::copy(&mut reader, &mut writer)
            .map_err(|e| FreezerError::download(url, e))?;
        writer
            .flush()
            .map_err(|e| FreezerError::download(url, e))?;

        check_size(asset, written)?;
        debug!("Downloaded {} bytes to {}", written, dest.display());
        Ok(dest)
    }
}

#[async_trait]
impl ArtifactTransport for HttpTransport {
    async fn download(&self, asset: &ReleaseAsset, dest_dir: &Path) -> FreezerResult<PathBuf> {
        let transport = self.clone();
        let asset = asset.clone();
        let dest_dir = dest_dir.to_path_buf();
        tokio::task::spawn_blocking(move || transport.download_blocking(&asset, &dest_dir))
            .await
            .map_err(|e| FreezerError::Internal(format!("download task failed: {}", e)))?
    }
}

/// Reject truncated transfers when the release source reported a size
fn check_size(asset: &ReleaseAsset, written: u64) -> FreezerResult<()> {
    if asset.size > 0 && asset.size != written {
        return Err(FreezerError::download(
            &asset.download_url,
            format!("expected {} bytes, received {}", asset.size, written),
        ));
    }
    Ok(())
}

/// Asset name if it is a plain file name, otherwise a fixed fallback
pub(crate) fn asset_file_name(name: &str) -> &str {
    let plain = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0');
    if plain {
        name
    } else {
        FALLBACK_FILE_NAME
    }
}
