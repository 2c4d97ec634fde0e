//! GitHub token resolution
//!
//! Precedence: an explicit `--github-token` value, then `GITHUB_TOKEN` from
//! the environment. Empty values count as absent.

use crate::config::ConfigSource;
use crate::error::{FreezerError, FreezerResult};
use std::fmt;
use tracing::debug;

/// Environment variable consulted when no token flag is given
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Where a resolved token came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOrigin {
    Flag,
    Environment,
}

/// A GitHub personal access token
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct GithubToken {
    value: String,
    origin: TokenOrigin,
}

impl GithubToken {
    /// Resolve the token from an explicit flag value or the environment
    pub fn resolve(explicit: Option<&str>, source: &dyn ConfigSource) -> FreezerResult<Self> {
        if let Some(value) = explicit.filter(|v| !v.is_empty()) {
            debug!("Using GitHub token from --github-token");
            return Ok(Self {
                value: value.to_string(),
                origin: TokenOrigin::Flag,
            });
        }

        match source.env_var(GITHUB_TOKEN_ENV) {
            Some(value) if !value.is_empty() => {
                debug!("Using GitHub token from {}", GITHUB_TOKEN_ENV);
                Ok(Self {
                    value,
                    origin: TokenOrigin::Environment,
                })
            }
            _ => Err(FreezerError::CredentialMissing),
        }
    }

    /// The raw token value
    pub fn secret(&self) -> &str {
        &self.value
    }

    pub fn origin(&self) -> TokenOrigin {
        self.origin
    }

    /// Value for the HTTP `Authorization` header
    pub fn authorization_header(&self) -> String {
        format!("token {}", self.value)
    }
}

impl fmt::Debug for GithubToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubToken")
            .field("value", &"<redacted>")
            .field("origin", &self.origin)
            .finish()
    }
}
