//! Errors raised while fetching or caching temperature readings.

use thiserror::Error;

/// Longest upstream body excerpt kept on an error
const MAX_BODY_EXCERPT: usize = 500;

#[derive(Debug, Error)]
pub enum TemperatureError {
    #[error("StormGlass API error: {status}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid StormGlass response: {0}")]
    InvalidResponse(String),

    #[error("Missing required setting: {0}")]
    MissingApiKey(String),
}

impl TemperatureError {
    pub(crate) fn upstream_status(status: u16, body: &str) -> Self {
        let cut = body
            .char_indices()
            .map(|(i, _)| i)
            .nth(MAX_BODY_EXCERPT)
            .unwrap_or(body.len());
        Self::UpstreamStatus {
            status,
            body: body[..cut].to_string(),
        }
    }

    /// Coarse category for logs: "upstream" for anything on the provider
    /// side or the way to it, "config" for missing local settings.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UpstreamStatus { .. } | Self::Network(_) | Self::InvalidResponse(_) => {
                "upstream"
            }
            Self::MissingApiKey(_) => "config",
        }
    }

    /// Short operator-facing hint, logged next to the error.
    pub fn user_message(&self) -> String {
        match self {
            Self::UpstreamStatus { status, .. } if *status == 401 || *status == 403 => {
                "Weather provider rejected the API key".to_string()
            }
            Self::UpstreamStatus { status: 402, .. } | Self::UpstreamStatus { status: 429, .. } => {
                "Weather provider quota exceeded. Try again later.".to_string()
            }
            Self::UpstreamStatus { status, .. } => {
                format!("Weather provider returned status {}", status)
            }
            Self::Network(_) => "Could not reach the weather provider".to_string(),
            Self::InvalidResponse(_) => "Weather provider sent unusable data".to_string(),
            Self::MissingApiKey(_) => "Weather API key is not configured".to_string(),
        }
    }
}
