//! Process-environment lookups behind a trait
//!
//! The home directory and environment variables are read through
//! [`ConfigSource`] so resolution can be tested with fixed values.

use std::collections::HashMap;
use std::path::PathBuf;

/// Where configuration resolution reads ambient process state from
pub trait ConfigSource {
    /// Home directory of the current user
    fn home_dir(&self) -> Option<PathBuf>;

    /// Value of an environment variable, if set
    fn env_var(&self, name: &str) -> Option<String>;
}

/// Reads the real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSource;

impl ConfigSource for SystemSource {
    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Fixed values, for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct FixedSource {
    home: Option<PathBuf>,
    vars: HashMap<String, String>,
}

impl FixedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl ConfigSource for FixedSource {
    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}
