//! Resolved configuration for the stock command
//!
//! Precedence for every optional value: command-line flag, then the settings
//! file, then the built-in default.

use crate::buildpack::RemoteBuildpack;
use crate::cli::args::StockArgs;
use crate::config::schema::StockSettings;
use crate::config::ConfigSource;
use crate::creds::GithubToken;
use crate::error::{FreezerError, FreezerResult};
use std::path::{Path, PathBuf};
use url::Url;

/// Cache directory name created under the user's home directory
pub const DEFAULT_CACHE_DIR_NAME: &str = ".freezer-cache";

/// Release API used when no endpoint is configured
pub const DEFAULT_GIT_ENDPOINT: &str = "https://api.github.com";

/// Immutable inputs for one `freezer stock` invocation
#[derive(Debug, Clone)]
pub struct StockConfig {
    buildpack: RemoteBuildpack,
    cache_dir: PathBuf,
    endpoint: Url,
    token: GithubToken,
}

impl StockConfig {
    /// Validate the flags and fill in defaults
    ///
    /// Identity problems are reported before anything else is looked at, so a
    /// missing `--org` never triggers a home-directory or token lookup.
    pub fn resolve(
        args: &StockArgs,
        settings: &StockSettings,
        source: &dyn ConfigSource,
    ) -> FreezerResult<Self> {
        let buildpack = RemoteBuildpack::new(args.org.trim(), args.repo.trim())?;

        let endpoint_str = args
            .git_endpoint
            .as_deref()
            .or(settings.git_endpoint.as_deref())
            .unwrap_or(DEFAULT_GIT_ENDPOINT);
        let endpoint = parse_endpoint(endpoint_str)?;

        let cache_dir = resolve_cache_dir(args.cache_directory.as_deref(), settings, source)?;

        let token = GithubToken::resolve(args.github_token.as_deref(), source)?;

        Ok(Self {
            buildpack,
            cache_dir,
            endpoint,
            token,
        })
    }

    pub fn buildpack(&self) -> &RemoteBuildpack {
        &self.buildpack
    }

    pub fn cache_dir(&self) -> &PathBuf {
        &self.cache_dir
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn token(&self) -> &GithubToken {
        &self.token
    }
}

/// Cache root from a flag value, the settings file or the home directory
pub fn resolve_cache_dir(
    flag: Option<&Path>,
    settings: &StockSettings,
    source: &dyn ConfigSource,
) -> FreezerResult<PathBuf> {
    match flag.or(settings.cache_directory.as_deref()) {
        Some(dir) => Ok(dir.to_path_buf()),
        None => default_cache_dir(source),
    }
}

/// `<home>/.freezer-cache`
pub fn default_cache_dir(source: &dyn ConfigSource) -> FreezerResult<PathBuf> {
    source
        .home_dir()
        .map(|home| home.join(DEFAULT_CACHE_DIR_NAME))
        .ok_or(FreezerError::HomeDirUnknown)
}

fn parse_endpoint(raw: &str) -> FreezerResult<Url> {
    let url = Url::parse(raw).map_err(|e| FreezerError::InvalidFlag {
        flag: "git-endpoint",
        reason: format!("'{}' is not a valid URL: {}", raw, e),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(FreezerError::InvalidFlag {
            flag: "git-endpoint",
            reason: format!("'{}' must use http or https", raw),
        });
    }

    Ok(url)
}
