//! Fetching buildpacks into the cache
//!
//! [`RemoteFetcher`] drives the lookup / query / download / unpack / publish
//! sequence over injected collaborators:
//! - [`ArtifactTransport`]: downloads release assets (HTTP in production)
//! - [`PackagingTool`]: verifies and unpacks archives (tar + gzip)
//! - [`TempProvider`]: scratch directories inside the cache's staging area

mod factory;
pub mod fetcher;
pub mod packager;
pub mod scratch;
pub mod transport;

pub use factory::{FetchFactory, GithubFactory};
pub use fetcher::{FetchStage, RemoteFetcher};
pub use packager::{PackagingTool, TarballPackager, UnpackedArtifact};
pub use scratch::{ScratchDir, StagingArea, TempProvider};
pub use transport::{ArtifactTransport, HttpTransport};
