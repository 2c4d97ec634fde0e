//! Credential resolution for the release source

pub mod github;

pub use github::{GithubToken, TokenOrigin, GITHUB_TOKEN_ENV};
