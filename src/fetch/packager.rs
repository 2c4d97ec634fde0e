//! Verifying and unpacking buildpack archives
//!
//! Buildpacks are published as gzipped tarballs. The archive is hashed,
//! checked against the digest the release source published (if any), and
//! extracted with every entry confined to the destination directory.

use crate::error::{FreezerError, FreezerResult};
use async_trait::async_trait;
use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Result of a successful unpack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackedArtifact {
    /// Directory holding the extracted files
    pub dir: PathBuf,
    /// SHA-256 of the archive, lowercase hex
    pub sha256: String,
}

/// Verifies and unpacks downloaded artifacts
#[async_trait]
pub trait PackagingTool: Send + Sync {
    /// Unpack `archive` into `dest`, which must exist and be empty
    async fn unpack(
        &self,
        archive: &Path,
        expected_sha256: Option<&str>,
        dest: &Path,
    ) -> FreezerResult<UnpackedArtifact>;
}

/// Packaging tool for `.tgz` / `.tar.gz` archives
#[derive(Debug, Clone, Copy, Default)]
pub struct TarballPackager;

impl TarballPackager {
    fn unpack_blocking(
        archive: &Path,
        expected_sha256: Option<&str>,
        dest: &Path,
    ) -> FreezerResult<UnpackedArtifact> {
        let sha256 = sha256_file(archive)?;
        if let Some(expected) = expected_sha256 {
            if !expected.eq_ignore_ascii_case(&sha256) {
                return Err(FreezerError::unpack(
                    archive,
                    format!("checksum mismatch: expected {}, got {}", expected, sha256),
                ));
            }
            debug!("Verified sha256 of {}", archive.display());
        }

        let file = File::open(archive).map_err(|e| FreezerError::unpack(archive, e))?;
        let mut tarball = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
        tarball.set_preserve_permissions(true);

        let entries = tarball
            .entries()
            .map_err(|e| FreezerError::unpack(archive, e))?;

        let mut count = 0usize;
        for entry in entries {
            let mut entry = entry.map_err(|e| FreezerError::unpack(archive, e))?;
            let path = entry
                .path()
                .map_err(|e| FreezerError::unpack(archive, e))?
                .into_owned();
            validate_entry_path(&path).map_err(|reason| FreezerError::unpack(archive, reason))?;

            let unpacked = entry
                .unpack_in(dest)
                .map_err(|e| FreezerError::unpack(archive, e))?;
            if !unpacked {
                return Err(FreezerError::unpack(
                    archive,
                    format!("entry {} escapes the destination", path.display()),
                ));
            }
            count += 1;
        }

        if count == 0 {
            return Err(FreezerError::unpack(archive, "archive is empty"));
        }

        debug!("Unpacked {} entries into {}", count, dest.display());
        Ok(UnpackedArtifact {
            dir: dest.to_path_buf(),
            sha256,
        })
    }
}

#[async_trait]
impl PackagingTool for TarballPackager {
    async fn unpack(
        &self,
        archive: &Path,
        expected_sha256: Option<&str>,
        dest: &Path,
    ) -> FreezerResult<UnpackedArtifact> {
        let archive = archive.to_path_buf();
        let expected = expected_sha256.map(str::to_string);
        let dest = dest.to_path_buf();
        tokio::task::spawn_blocking(move || {
            Self::unpack_blocking(&archive, expected.as_deref(), &dest)
        })
        .await
        .map_err(|e| FreezerError::Internal(format!("unpack task failed: {}", e)))?
    }
}

/// SHA-256 of a file's contents as lowercase hex
pub fn sha256_file(path: &Path) -> FreezerResult<String> {
    let mut file = File::open(path).map_err(|e| FreezerError::unpack(path, e))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).map_err(|e| FreezerError::unpack(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Entries must be relative and must not climb out with `..`
fn validate_entry_path(path: &Path) -> Result<(), String> {
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err(format!("entry {} contains '..'", path.display()));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(format!("entry {} is an absolute path", path.display()));
            }
        }
    }
    Ok(())
}
