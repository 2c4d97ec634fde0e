//! Cache command - inspect and clear the buildpack cache

use crate::cache::{CacheIndex, INDEX_FILE, STAGING_DIR};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::config::stock::resolve_cache_dir;
use crate::config::{Settings, SystemSource};
use crate::error::{FreezerError, FreezerResult};
use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Execute the cache command
pub async fn execute(args: CacheArgs, settings: &Settings) -> FreezerResult<()> {
    match args.action {
        CacheAction::List {
            cache_directory,
            format,
        } => {
            let root = resolve_cache_dir(cache_directory.as_deref(), &settings.stock, &SystemSource)?;
            list_cache(&root, format)
        }
        CacheAction::Clear {
            cache_directory,
            yes,
        } => {
            let root = resolve_cache_dir(cache_directory.as_deref(), &settings.stock, &SystemSource)?;
            clear_with_confirmation(&root, yes)
        }
    }
}

/// One published buildpack as shown by `cache list`
#[derive(Debug, Serialize)]
struct CachedBuildpack {
    buildpack: String,
    version: String,
    path: PathBuf,
    asset: String,
    sha256: String,
    fetched_at: DateTime<Utc>,
    present: bool,
}

/// Read the index without creating anything on disk
fn cached_buildpacks(root: &Path) -> FreezerResult<Vec<CachedBuildpack>> {
    let index = CacheIndex::load(&root.join(INDEX_FILE))?;
    Ok(index
        .iter()
        .map(|(key, entry)| CachedBuildpack {
            buildpack: key.replacen(':', "/", 1),
            version: entry.version.clone(),
            path: entry.uri.clone(),
            asset: entry.asset.clone(),
            sha256: entry.sha256.clone(),
            fetched_at: entry.fetched_at,
            present: entry.uri.is_dir(),
        })
        .collect())
}

fn list_cache(root: &Path, format: OutputFormat) -> FreezerResult<()> {
    let cached = cached_buildpacks(root)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&cached)?),
        OutputFormat::Plain => {
            for item in &cached {
                println!("{}", item.path.display());
            }
        }
        OutputFormat::Table => {
            if cached.is_empty() {
                println!("No cached buildpacks in {}", root.display());
            } else {
                print_table(&cached);
            }
        }
    }

    Ok(())
}

fn print_table(cached: &[CachedBuildpack]) {
    println!(
        "{:<40} {:<12} {:<10} {:<20}",
        "BUILDPACK", "VERSION", "STATE", "FETCHED"
    );
    println!("{}", "-".repeat(82));

    for item in cached {
        let state = if item.present {
            style("ok").green().to_string()
        } else {
            style("missing").yellow().to_string()
        };
        println!(
            "{:<40} {:<12} {:<10} {:<20}",
            item.buildpack,
            item.version,
            state,
            item.fetched_at.format("%Y-%m-%d %H:%M")
        );
    }

    println!();
    println!("Total: {} buildpack(s)", cached.len());
}

fn clear_with_confirmation(root: &Path, skip_confirm: bool) -> FreezerResult<()> {
    let cached = cached_buildpacks(root)?;
    if cached.is_empty() && !root.join(STAGING_DIR).exists() {
        println!("Nothing to clear in {}", root.display());
        return Ok(());
    }

    println!("This will remove {} cached buildpack(s):", cached.len());
    for item in &cached {
        println!("  {} {} {}", style("•").red(), item.buildpack, item.version);
    }
    println!();

    if !skip_confirm {
        print!("Are you sure? [y/N] ");
        let _ = io::stdout().flush();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            println!("Failed to read input, aborting.");
            return Ok(());
        }

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let removed = clear_cache(root)?;
    println!("{} cleared {} buildpack(s)", style("✓").green(), removed);
    Ok(())
}

/// Remove every published directory, the index and the staging area
///
/// Returns how many indexed buildpacks were removed. Directories that are
/// not referenced by the index are left alone, and so are indexed paths
/// that resolve outside the cache root.
fn clear_cache(root: &Path) -> FreezerResult<usize> {
    let index = CacheIndex::load(&root.join(INDEX_FILE))?;
    let real_root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

    let mut removed = 0;
    for (key, entry) in index.iter() {
        match entry.uri.canonicalize() {
            Ok(real) if real.starts_with(&real_root) && real != real_root => {
                debug!("Removing {} at {}", key, real.display());
                remove_dir_if_present(&real)?;
            }
            Ok(real) => {
                warn!(
                    "Not removing {}: {} is outside the cache at {}",
                    key,
                    real.display(),
                    real_root.display()
                );
                continue;
            }
            Err(_) => debug!("{} at {} is already gone", key, entry.uri.display()),
        }
        removed += 1;
    }

    remove_dir_if_present(&root.join(STAGING_DIR))?;
    match std::fs::remove_file(root.join(INDEX_FILE)) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(FreezerError::cache("removing cache index", e)),
    }

    Ok(removed)
}

fn remove_dir_if_present(dir: &Path) -> FreezerResult<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FreezerError::cache(format!("removing {}", dir.display()), e)),
    }
}
