//! Error types for Freezer
//!
//! All modules use `FreezerResult<T>` as their return type. Every failure
//! travels through this enum up to the command boundary unchanged.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Freezer operations
pub type FreezerResult<T> = Result<T, FreezerError>;

/// All errors that can occur in Freezer
#[derive(Error, Debug)]
pub enum FreezerError {
    // Configuration errors
    #[error("missing required flag --{0}")]
    MissingFlag(&'static str),

    #[error("invalid value for --{flag}: {reason}")]
    InvalidFlag { flag: &'static str, reason: String },

    #[error("Invalid settings file at {path}: {reason}")]
    SettingsInvalid { path: PathBuf, reason: String },

    #[error("Could not determine the current user's home directory")]
    HomeDirUnknown,

    // Credential errors
    #[error("No GitHub token found. Use the --github-token flag or set the GITHUB_TOKEN environment variable")]
    CredentialMissing,

    // Cache errors
    #[error("Failed to open cache at {path}: {source}")]
    CacheOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt cache index {path}: {reason}")]
    CacheIndexCorrupt { path: PathBuf, reason: String },

    #[error("Cache error: {context}")]
    Cache {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Release source errors
    #[error("GitHub rejected the credential for {identity} (HTTP {status})")]
    Auth { identity: String, status: u16 },

    #[error("GitHub rate limit exceeded while querying {identity}")]
    RateLimited { identity: String },

    #[error("No releases found for {identity}")]
    ReleaseNotFound { identity: String },

    #[error("Release query for {identity} failed: {reason}")]
    Remote { identity: String, reason: String },

    // Fetch errors
    #[error("Release {version} of {identity} has no matching asset (found: {found})")]
    NoMatchingAsset {
        identity: String,
        version: String,
        found: String,
    },

    #[error("Failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Failed to unpack {archive}: {reason}")]
    Unpack { archive: PathBuf, reason: String },

    #[error("Failed to publish {identity} {version} into the cache: {reason}")]
    Publish {
        identity: String,
        version: String,
        reason: String,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`FreezerError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Credential,
    Cache,
    Auth,
    RateLimit,
    NotFound,
    Remote,
    Download,
    Unpack,
    Publish,
    Io,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::Credential => "credential",
            Self::Cache => "cache",
            Self::Auth => "auth",
            Self::RateLimit => "rate-limit",
            Self::NotFound => "not-found",
            Self::Remote => "remote",
            Self::Download => "download",
            Self::Unpack => "unpack",
            Self::Publish => "publish",
            Self::Io => "io",
            Self::Internal => "internal",
        };
        write!(f, "{}", name)
    }
}

impl FreezerError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a cache IO error with context
    pub fn cache(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Cache {
            context: context.into(),
            source,
        }
    }

    /// Create a download error
    pub fn download(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Download {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an unpack error
    pub fn unpack(archive: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::Unpack {
            archive: archive.into(),
            reason: reason.to_string(),
        }
    }

    /// Which part of the taxonomy this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingFlag(_)
            | Self::InvalidFlag { .. }
            | Self::SettingsInvalid { .. }
            | Self::HomeDirUnknown => ErrorKind::Configuration,
            Self::CredentialMissing => ErrorKind::Credential,
            Self::CacheOpen { .. } | Self::CacheIndexCorrupt { .. } | Self::Cache { .. } => {
                ErrorKind::Cache
            }
            Self::Auth { .. } => ErrorKind::Auth,
            Self::RateLimited { .. } => ErrorKind::RateLimit,
            Self::ReleaseNotFound { .. } => ErrorKind::NotFound,
            Self::Remote { .. } => ErrorKind::Remote,
            Self::NoMatchingAsset { .. } | Self::Download { .. } => ErrorKind::Download,
            Self::Unpack { .. } => ErrorKind::Unpack,
            Self::Publish { .. } => ErrorKind::Publish,
            Self::Io { .. } | Self::Json(_) | Self::TomlSerialize(_) => ErrorKind::Io,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingFlag(_) => Some("Run: freezer stock --help"),
            Self::CredentialMissing => Some("Run: export GITHUB_TOKEN=<personal access token>"),
            Self::Auth { .. } => Some("Check that the GitHub token is valid and not expired"),
            Self::RateLimited { .. } => {
                Some("Provide a GitHub token to raise the rate limit, or retry later")
            }
            Self::CacheIndexCorrupt { .. } => Some("Run: freezer cache clear"),
            _ => None,
        }
    }
}
