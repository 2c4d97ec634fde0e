//! Buildpack identity
//!
//! A buildpack is named by the GitHub organization and repository that
//! publish it. The pair is the cache key and the release query target.

use crate::error::{FreezerError, FreezerResult};
use std::fmt;
use std::path::PathBuf;

/// Identity of a buildpack published as GitHub release assets
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteBuildpack {
    org: String,
    repo: String,
}

impl RemoteBuildpack {
    /// Create an identity, validating that both parts are usable path segments
    pub fn new(org: impl Into<String>, repo: impl Into<String>) -> FreezerResult<Self> {
        let org = org.into();
        let repo = repo.into();
        validate_segment("org", &org)?;
        validate_segment("repo", &repo)?;
        Ok(Self { org, repo })
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Key under which the cache index stores this buildpack
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.org, self.repo)
    }

    /// Relative directory holding every cached version of this buildpack
    pub fn cache_subdir(&self) -> PathBuf {
        PathBuf::from(&self.org).join(&self.repo)
    }
}

impl fmt::Display for RemoteBuildpack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.org, self.repo)
    }
}

/// Reject empty values and anything that could escape the cache directory
pub(crate) fn validate_segment(flag: &'static str, value: &str) -> FreezerResult<()> {
    if value.is_empty() {
        return Err(FreezerError::MissingFlag(flag));
    }
    if value.contains('/')
        || value.contains('\\')
        || value.contains('\0')
        || value == "."
        || value == ".."
    {
        return Err(FreezerError::InvalidFlag {
            flag,
            reason: format!("'{}' must not contain path separators or be '.' or '..'", value),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_equality_is_structural() {
        let a = RemoteBuildpack::new("cloudfoundry", "nodejs-cnb").unwrap();
        let b = RemoteBuildpack::new("cloudfoundry".to_string(), "nodejs-cnb".to_string()).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, RemoteBuildpack::new("cloudfoundry", "go-cnb").unwrap());
    }

    #[test]
    fn cache_key_and_display() {
        let bp = RemoteBuildpack::new("cloudfoundry", "nodejs-cnb").unwrap();
        assert_eq!(bp.cache_key(), "cloudfoundry:nodejs-cnb");
        assert_eq!(bp.to_string(), "cloudfoundry/nodejs-cnb");
        assert_eq!(bp.cache_subdir(), PathBuf::from("cloudfoundry").join("nodejs-cnb"));
    }

    #[test]
    fn empty_parts_name_the_missing_flag() {
        let err = RemoteBuildpack::new("", "nodejs-cnb").unwrap_err();
        assert!(matches!(err, FreezerError::MissingFlag("org")));

        let err = RemoteBuildpack::new("cloudfoundry", "").unwrap_err();
        assert!(matches!(err, FreezerError::MissingFlag("repo")));
    }

    #[test]
    fn path_traversal_rejected() {
        assert!(RemoteBuildpack::new("..", "x").is_err());
        assert!(RemoteBuildpack::new("a/b", "x").is_err());
        assert!(RemoteBuildpack::new("a", "x\\y").is_err());
        assert!(RemoteBuildpack::new("a", ".").is_err());
    }

    #[test]
    fn dots_inside_a_name_are_allowed() {
        let bp = RemoteBuildpack::new("paketo.io", "foo..bar").unwrap();
        assert_eq!(bp.cache_subdir(), PathBuf::from("paketo.io").join("foo..bar"));
        assert!(RemoteBuildpack::new("org", "..hidden").is_ok());
    }
}
