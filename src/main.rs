use std::sync::Arc;

use anyhow::Result;
use seatemp_core::{AppError, Config, ConfigError};
use seatemp_weather::{RefreshCache, StalePolicy, StormGlassProvider};

#[tokio::main]
async fn main() -> Result<()> {
    seatemp_core::init()?;

    let config = match Config::load_validated() {
        Ok((config, _)) => config,
        Err(e) => {
            let err = AppError::Config(ConfigError::from(e));
            tracing::error!("{} ({})", err, err.user_message());
            return Err(err.into());
        }
    };

    let provider =
        match StormGlassProvider::new(&config.upstream.endpoint, &config.upstream.api_key_env) {
            Ok(provider) => provider,
            Err(e) => {
                let err = AppError::Other(e.into());
                tracing::error!(
                    "Failed to build StormGlass client: {} ({})",
                    err,
                    err.user_message()
                );
                return Err(err.into());
            }
        };

    if !provider.has_api_key() {
        tracing::warn!(
            "{} is not set - temperature requests will fail",
            provider.api_key_env()
        );
    }

    let policy = if config.cache.serve_stale_on_error {
        StalePolicy::ServeStale
    } else {
        StalePolicy::Propagate
    };
    let cache = Arc::new(RefreshCache::new(Arc::new(provider)).with_stale_policy(policy));

    tracing::info!(
        "Proxying {} (stale policy: {:?})",
        config.upstream.endpoint,
        cache.stale_policy()
    );

    if let Err(e) = seatemp_server::serve(&config.server, cache).await {
        tracing::error!("{} ({})", e, e.user_message());
        return Err(e.into());
    }

    Ok(())
}
