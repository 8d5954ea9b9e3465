//! warp filters for the dashboard API and static assets.

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use seatemp_weather::RefreshCache;

/// Body sent with a 500
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// All routes: the temperature API first, then files from `static_dir`.
pub fn routes(
    cache: Arc<RefreshCache>,
    static_dir: PathBuf,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    temperature(cache)
        .or(warp::get().and(warp::fs::dir(static_dir)))
        .with(warp::trace::request())
}

/// GET /api/temperature
pub fn temperature(
    cache: Arc<RefreshCache>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("api" / "temperature")
        .and(warp::get())
        .and(with_cache(cache))
        .and_then(get_temperature)
}

fn with_cache(
    cache: Arc<RefreshCache>,
) -> impl Filter<Extract = (Arc<RefreshCache>,), Error = Infallible> + Clone {
    warp::any().map(move || cache.clone())
}

async fn get_temperature(cache: Arc<RefreshCache>) -> Result<Response, Infallible> {
    match cache.get().await {
        Ok(reading) => Ok(warp::reply::json(&reading).into_response()),
        Err(e) => {
            tracing::error!(
                kind = e.kind(),
                hint = %e.user_message(),
                "Error fetching StormGlass data: {}",
                e
            );
            let body = ErrorBody {
                error: e.to_string(),
            };
            Ok(
                warp::reply::with_status(warp::reply::json(&body), StatusCode::INTERNAL_SERVER_ERROR)
                    .into_response(),
            )
        }
    }
}
