//! Water temperature service for seatemp
//!
//! Fetches the trailing 24 hours of sea surface temperature for Ngamotu from
//! StormGlass and keeps the last good reading in memory.

pub mod cache;
pub mod clock;
pub mod error;
pub mod location;
pub mod provider;
pub mod types;

pub use cache::{CacheState, RefreshCache, StalePolicy, STALENESS_WINDOW_SECS};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::TemperatureError;
pub use location::{Coordinate, NGAMOTU};
pub use provider::{api_key_from_env, StormGlassProvider, TemperatureSource};
pub use types::*;
