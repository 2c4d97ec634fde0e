//! GitHub releases API client
//!
//! Queries `GET {endpoint}/repos/{org}/{repo}/releases/latest`. The HTTP
//! call is blocking (`ureq`) and runs on tokio's blocking pool.

use crate::buildpack::RemoteBuildpack;
use crate::creds::GithubToken;
use crate::error::{FreezerError, FreezerResult};
use crate::release::{ReleaseAsset, ReleaseMetadata, ReleaseSource};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// User agent sent with every request (GitHub rejects requests without one)
pub const USER_AGENT: &str = concat!("freezer/", env!("CARGO_PKG_VERSION"));

/// Upper bound on any single HTTP exchange, including body transfer
const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Build the HTTP agent shared by the release client and the transport
///
/// Status codes are returned as responses rather than errors so callers can
/// map them onto the error taxonomy themselves.
pub fn http_agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(HTTP_TIMEOUT))
        .user_agent(USER_AGENT)
        .build();
    ureq::Agent::new_with_config(config)
}

#[derive(Debug, Deserialize)]
struct GithubRelease {
    tag_name: String,
    #[serde(default)]
    assets: Vec<GithubAsset>,
}

#[derive(Debug, Deserialize)]
struct GithubAsset {
    name: String,
    browser_download_url: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    digest: Option<String>,
}

impl From<GithubRelease> for ReleaseMetadata {
    fn from(release: GithubRelease) -> Self {
        let assets = release
            .assets
            .into_iter()
            .map(|a| ReleaseAsset {
                name: a.name,
                download_url: a.browser_download_url,
                size: a.size,
                digest: a.digest,
            })
            .collect();
        ReleaseMetadata::new(release.tag_name, assets)
    }
}

/// Release source backed by the GitHub REST API
#[derive(Clone)]
pub struct GithubReleaseService {
    agent: ureq::Agent,
    endpoint: Url,
    token: GithubToken,
}

impl GithubReleaseService {
    pub fn new(endpoint: Url, token: GithubToken) -> Self {
        Self {
            agent: http_agent(),
            endpoint,
            token,
        }
    }

    /// URL of the latest-release resource for a buildpack
    pub fn latest_release_url(&self, buildpack: &RemoteBuildpack) -> String {
        format!(
            "{}/repos/{}/{}/releases/latest",
            self.endpoint.as_str().trim_end_matches('/'),
            buildpack.org(),
            buildpack.repo()
        )
    }

    fn query_blocking(&self, buildpack: &RemoteBuildpack) -> FreezerResult<ReleaseMetadata> {
        let url = self.latest_release_url(buildpack);
        debug!("Querying {}", url);

        let remote_err = |reason: String| FreezerError::Remote {
            identity: buildpack.to_string(),
            reason,
        };

        let mut response = self
            .agent
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", self.token.authorization_header())
            .call()
            .map_err(|e| remote_err(e.to_string()))?;

        let status = response.status().as_u16();
        let remaining = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(err) = classify_status(buildpack, status, remaining.as_deref()) {
            return Err(err);
        }

        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| remote_err(format!("reading response body: {}", e)))?;

        let metadata = parse_release(&body).map_err(|e| remote_err(e.to_string()))?;
        debug!(
            "Latest release of {} is {} with {} asset(s)",
            buildpack,
            metadata.tag,
            metadata.assets.len()
        );
        Ok(metadata)
    }
}

#[async_trait]
impl ReleaseSource for GithubReleaseService {
    async fn query(&self, buildpack: &RemoteBuildpack) -> FreezerResult<ReleaseMetadata> {
        let service = self.clone();
        let buildpack = buildpack.clone();
        tokio::task::spawn_blocking(move || service.query_blocking(&buildpack))
            .await
            .map_err(|e| FreezerError::Internal(format!("release query task failed: {}", e)))?
    }
}

/// Decode a GitHub release JSON document
pub(crate) fn parse_release(body: &str) -> Result<ReleaseMetadata, serde_json::Error> {
    let release: GithubRelease = serde_json::from_str(body)?;
    Ok(release.into())
}

/// Map a non-success HTTP status onto the release error taxonomy
///
/// Returns `None` for 2xx.
pub(crate) fn classify_status(
    buildpack: &RemoteBuildpack,
    status: u16,
    ratelimit_remaining: Option<&str>,
) -> Option<FreezerError> {
    let identity = buildpack.to_string();
    match status {
        200..=299 => None,
        429 => Some(FreezerError::RateLimited { identity }),
        403 if ratelimit_remaining == Some("0") => Some(FreezerError::RateLimited { identity }),
        401 | 403 => Some(FreezerError::Auth { identity, status }),
        404 => Some(FreezerError::ReleaseNotFound { identity }),
        other => Some(FreezerError::Remote {
            identity,
            reason: format!("unexpected HTTP status {}", other),
        }),
    }
}
