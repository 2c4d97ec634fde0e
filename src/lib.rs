//! Freezer - buildpack fetcher with a local cache
//!
//! Resolves a buildpack published as a GitHub release to a directory on
//! disk, downloading and unpacking it only when the cache has no copy.

pub mod buildpack;
pub mod cache;
pub mod cli;
pub mod config;
pub mod creds;
pub mod error;
pub mod fetch;
pub mod release;

#[cfg(test)]
mod testing;

pub use error::{FreezerError, FreezerResult};
