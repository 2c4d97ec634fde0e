//! Persistent buildpack cache
//!
//! Unpacked buildpacks are stored per `(org, repo, version)` under a cache
//! root, with a JSON index mapping each buildpack to its latest entry.
//!
//! # Visibility rules
//!
//! | Location | Visible to lookup | Description |
//! |----------|-------------------|-------------|
//! | `.staging/` | no | scratch space, may hold leftovers from failed fetches |
//! | `<org>/<repo>/<version>/` | when indexed | complete, renamed into place |
//! | `buildpacks-cache.lock` | no | held exclusively while the index is rewritten |

pub mod index;
pub mod session;

pub use index::{ArtifactProvenance, CacheEntry, CacheIndex, INDEX_FILE, INDEX_LOCK_FILE};
pub use session::{CacheSession, DiskCache, SessionGuard, STAGING_DIR};
