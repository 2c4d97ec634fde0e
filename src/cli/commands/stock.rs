//! Stock command - fetch a buildpack through the cache

use crate::cache::SessionGuard;
use crate::cli::args::StockArgs;
use crate::config::schema::StockSettings;
use crate::config::{ConfigSource, Settings, StockConfig, SystemSource};
use crate::error::FreezerResult;
use crate::fetch::{FetchFactory, GithubFactory, RemoteFetcher};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Execute the stock command
pub async fn execute(args: StockArgs, settings: &Settings) -> FreezerResult<()> {
    let path = stock(&args, &settings.stock, &SystemSource, &GithubFactory).await?;
    println!("{}", path.display());
    Ok(())
}

/// Resolve configuration, open the cache and fetch the buildpack
///
/// The cache session is closed exactly once after it has been opened, no
/// matter how the fetch ended; if this future is dropped mid-fetch the
/// guard closes it. A fetch error takes priority over a close error.
pub async fn stock(
    args: &StockArgs,
    settings: &StockSettings,
    source: &dyn ConfigSource,
    factory: &dyn FetchFactory,
) -> FreezerResult<PathBuf> {
    let config = StockConfig::resolve(args, settings, source)?;
    debug!(
        "Stocking {} from {} into {} (token from {:?})",
        config.buildpack(),
        config.endpoint(),
        config.cache_dir().display(),
        config.token().origin()
    );

    let mut cache = SessionGuard::new(factory.open_cache(config.cache_dir()).await?);

    let releases = factory.release_source(&config);
    let transport = factory.transport(&config);
    let packager = factory.packager();
    let scratch = factory.temp_provider(config.cache_dir());

    let fetched = RemoteFetcher::new(
        cache.session(),
        releases.as_ref(),
        transport.as_ref(),
        packager.as_ref(),
        scratch.as_ref(),
    )
    .get(config.buildpack())
    .await;

    let closed = cache.close();
    match (fetched, closed) {
        (Ok(path), Ok(())) => Ok(path),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            warn!("Failed to close cache after error: {}", close_err);
            Err(e)
        }
    }
}
