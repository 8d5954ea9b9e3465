use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TemperatureError;

/// Display format for sample times, e.g. "03:00 PM"
pub const DISPLAY_TIME_FORMAT: &str = "%I:%M %p";

/// One hourly water temperature sample as shown on the dashboard chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperaturePoint {
    /// Degrees Celsius
    pub temperature: f64,
    /// Local hour:minute label
    pub time: String,
}

/// Latest water temperature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentTemperature {
    pub temperature: f64,
}

/// Normalized 24 hour window, oldest sample first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
    pub current: CurrentTemperature,
    pub history: Vec<TemperaturePoint>,
}

/// Body returned by the StormGlass point endpoint
#[derive(Debug, Deserialize)]
pub struct StormGlassResponse {
    pub hours: Vec<StormGlassHour>,
}

#[derive(Debug, Deserialize)]
pub struct StormGlassHour {
    pub time: DateTime<Utc>,
    #[serde(rename = "waterTemperature")]
    pub water_temperature: SourceValues,
}

/// Per-source values. Only the StormGlass blend (`sg`) is used.
#[derive(Debug, Deserialize)]
pub struct SourceValues {
    pub sg: f64,
}

impl TemperatureReading {
    /// Map a StormGlass response into the dashboard shape, labelling sample
    /// times in `tz`.
    pub fn from_response<Tz>(response: StormGlassResponse, tz: &Tz) -> Result<Self, TemperatureError>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let last = response.hours.last().ok_or_else(|| {
            TemperatureError::InvalidResponse("StormGlass returned no hourly samples".to_string())
        })?;

        let current = CurrentTemperature {
            temperature: last.water_temperature.sg,
        };

        let history = response
            .hours
            .iter()
            .map(|hour| TemperaturePoint {
                temperature: hour.water_temperature.sg,
                time: format_display_time(&hour.time, tz),
            })
            .collect();

        Ok(Self { current, history })
    }
}

/// Format a sample time as a 12-hour "hh:mm AM/PM" label in `tz`
pub fn format_display_time<Tz>(time: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    time.with_timezone(tz).format(DISPLAY_TIME_FORMAT).to_string()
}
