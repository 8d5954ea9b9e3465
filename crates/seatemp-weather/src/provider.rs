//! StormGlass client for the trailing 24 hour water temperature window.

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Local, SecondsFormat, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use std::sync::Arc;
use tracing::instrument;

use crate::error::TemperatureError;
use crate::location::{Coordinate, NGAMOTU};
use crate::types::{StormGlassResponse, TemperatureReading};

/// StormGlass parameter name for sea surface temperature
pub const WATER_TEMPERATURE_PARAM: &str = "waterTemperature";

/// Length of the window requested on every fetch
pub const WINDOW_HOURS: i64 = 24;

/// Read an API key from `var`. Blank values count as missing.
pub fn api_key_from_env(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

/// Anything that can produce a fresh 24 hour reading.
#[async_trait]
pub trait TemperatureSource: Send + Sync {
    async fn fetch_window(&self) -> Result<TemperatureReading, TemperatureError>;
}

#[derive(Debug, Clone)]
pub struct StormGlassProvider {
    client: Arc<Client>,
    endpoint: String,
    api_key_env: String,
    api_key: Option<String>,
    coordinate: Coordinate,
    display_offset: Option<FixedOffset>,
}

impl StormGlassProvider {
    /// Create a provider that reads its API key from `api_key_env` on every fetch.
    pub fn new(endpoint: &str, api_key_env: &str) -> Result<Self, TemperatureError> {
        // No request timeout: the call runs as long as the network layer allows.
        let client = Client::builder().build()?;

        Ok(Self {
            client: Arc::new(client),
            endpoint: endpoint.to_string(),
            api_key_env: api_key_env.to_string(),
            api_key: None,
            coordinate: NGAMOTU,
            display_offset: None,
        })
    }

    /// Use a fixed key instead of the environment.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Label sample times in a fixed offset instead of the host's local zone.
    pub fn with_display_offset(mut self, offset: FixedOffset) -> Self {
        self.display_offset = Some(offset);
        self
    }

    fn resolve_api_key(&self) -> Result<String, TemperatureError> {
        if let Some(key) = &self.api_key {
            return Ok(key.clone());
        }

        api_key_from_env(&self.api_key_env)
            .ok_or_else(|| TemperatureError::MissingApiKey(self.api_key_env.clone()))
    }

    /// Whether a fetch right now would have a key to send
    pub fn has_api_key(&self) -> bool {
        self.resolve_api_key().is_ok()
    }

    /// Environment variable the key is read from
    pub fn api_key_env(&self) -> &str {
        &self.api_key_env
    }

    /// Fetch the 24 hours ending at `end`.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_window_ending(
        &self,
        end: DateTime<Utc>,
    ) -> Result<TemperatureReading, TemperatureError> {
        let api_key = self.resolve_api_key()?;
        let start = end - Duration::hours(WINDOW_HOURS);

        let query = [
            ("lat", self.coordinate.latitude.to_string()),
            ("lng", self.coordinate.longitude.to_string()),
            ("params", WATER_TEMPERATURE_PARAM.to_string()),
            ("start", start.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ("end", end.to_rfc3339_opts(SecondsFormat::Millis, true)),
        ];

        tracing::debug!("Requesting StormGlass window {} .. {}", query[3].1, query[4].1);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .header(AUTHORIZATION, api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TemperatureError::upstream_status(status.as_u16(), &body));
        }

        let parsed: StormGlassResponse = serde_json::from_str(&body)
            .map_err(|e| TemperatureError::InvalidResponse(format!("JSON parse error: {}", e)))?;

        let reading = match &self.display_offset {
            Some(offset) => TemperatureReading::from_response(parsed, offset)?,
            None => TemperatureReading::from_response(parsed, &Local)?,
        };

        tracing::info!(
            "Fetched {} StormGlass samples, current {:.1}°C",
            reading.history.len(),
            reading.current.temperature
        );

        Ok(reading)
    }
}

#[async_trait]
impl TemperatureSource for StormGlassProvider {
    async fn fetch_window(&self) -> Result<TemperatureReading, TemperatureError> {
        self.fetch_window_ending(Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DEFAULT_TEST_ENDPOINT: &str = "http://127.0.0.1:9/v2/weather/point";

    fn hours_body(values: &[f64]) -> serde_json::Value {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let hours: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let time = start + Duration::hours(i as i64);
                serde_json::json!({
                    "time": time.to_rfc3339(),
                    "waterTemperature": { "sg": v }
                })
            })
            .collect();
        serde_json::json!({ "hours": hours })
    }

    fn provider(server: &MockServer) -> StormGlassProvider {
        StormGlassProvider::new(&format!("{}/v2/weather/point", server.uri()), "UNUSED_KEY_ENV")
            .unwrap()
            .with_api_key("test-key")
            .with_display_offset(FixedOffset::east_opt(0).unwrap())
    }

    #[tokio::test]
    async fn test_request_shape() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/weather/point"))
            .and(header("Authorization", "test-key"))
            .and(query_param("lat", "-39.0556"))
            .and(query_param("lng", "174.0452"))
            .and(query_param("params", "waterTemperature"))
            .and(query_param("start", "2024-03-01T12:00:00.000Z"))
            .and(query_param("end", "2024-03-02T12:00:00.000Z"))
            .respond_with(ResponseTemplate::new(200).set_body_json(hours_body(&[18.0, 18.4])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let end = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap();
        let reading = provider(&mock_server).fetch_window_ending(end).await.unwrap();

        assert_eq!(reading.history.len(), 2);
        assert_eq!(reading.current.temperature, 18.4);
        assert_eq!(reading.history[1].time, "01:00 AM");
    }

    #[tokio::test]
    async fn test_twenty_four_samples() {
        let mock_server = MockServer::start().await;

        let mut values: Vec<f64> = (0..23u32).map(|i| 18.0 + f64::from(i) * 0.05).collect();
        values.push(19.3);

        Mock::given(method("GET"))
            .and(path("/v2/weather/point"))
            .respond_with(ResponseTemplate::new(200).set_body_json(hours_body(&values)))
            .mount(&mock_server)
            .await;

        let reading = provider(&mock_server).fetch_window().await.unwrap();

        assert_eq!(reading.history.len(), 24);
        assert_eq!(reading.current.temperature, 19.3);
        assert_eq!(reading.history[0].temperature, 18.0);
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/weather/point"))
            .respond_with(
                ResponseTemplate::new(402)
                    .set_body_json(serde_json::json!({ "errors": { "key": "quota exceeded" } })),
            )
            .mount(&mock_server)
            .await;

        let result = provider(&mock_server).fetch_window().await;

        match result {
            Err(TemperatureError::UpstreamStatus { status, body }) => {
                assert_eq!(status, 402);
                assert!(body.contains("quota exceeded"));
            }
            other => panic!("expected UpstreamStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/weather/point"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&mock_server)
            .await;

        let result = provider(&mock_server).fetch_window().await;
        assert!(matches!(result, Err(TemperatureError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_missing_key_skips_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(hours_body(&[18.0])))
            .expect(0)
            .mount(&mock_server)
            .await;

        let provider = StormGlassProvider::new(
            &mock_server.uri(),
            "SEATEMP_PROVIDER_TEST_KEY_NEVER_SET",
        )
        .unwrap();
        let result = provider.fetch_window().await;

        match result {
            Err(TemperatureError::MissingApiKey(var)) => {
                assert_eq!(var, "SEATEMP_PROVIDER_TEST_KEY_NEVER_SET");
            }
            other => panic!("expected MissingApiKey, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_key_read_from_env() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(header("Authorization", "env-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(hours_body(&[17.9])))
            .expect(1)
            .mount(&mock_server)
            .await;

        std::env::set_var("SEATEMP_PROVIDER_TEST_KEY_FROM_ENV", "env-key");
        let provider =
            StormGlassProvider::new(&mock_server.uri(), "SEATEMP_PROVIDER_TEST_KEY_FROM_ENV")
                .unwrap();
        let reading = provider.fetch_window().await.unwrap();

        assert_eq!(reading.current.temperature, 17.9);
    }

    #[test]
    fn test_api_key_from_env_trims_and_rejects_blank() {
        std::env::set_var("SEATEMP_PROVIDER_TEST_KEY_PADDED", "  secret-key \n");
        assert_eq!(
            api_key_from_env("SEATEMP_PROVIDER_TEST_KEY_PADDED").as_deref(),
            Some("secret-key")
        );

        std::env::set_var("SEATEMP_PROVIDER_TEST_KEY_BLANK", "   ");
        assert_eq!(api_key_from_env("SEATEMP_PROVIDER_TEST_KEY_BLANK"), None);
        assert_eq!(api_key_from_env("SEATEMP_PROVIDER_TEST_KEY_NEVER_SET"), None);
    }

    #[test]
    fn test_has_api_key() {
        let unset =
            StormGlassProvider::new(DEFAULT_TEST_ENDPOINT, "SEATEMP_PROVIDER_TEST_KEY_NEVER_SET")
                .unwrap();
        assert!(!unset.has_api_key());
        assert_eq!(unset.api_key_env(), "SEATEMP_PROVIDER_TEST_KEY_NEVER_SET");

        let fixed = unset.with_api_key("k");
        assert!(fixed.has_api_key());
    }

    #[tokio::test]
    async fn test_network_failure() {
        // Nothing listens on port 9 (discard) in test environments
        let provider = StormGlassProvider::new("http://127.0.0.1:9/v2/weather/point", "UNUSED")
            .unwrap()
            .with_api_key("k");

        let result = provider.fetch_window().await;
        assert!(matches!(result, Err(TemperatureError::Network(_))));
    }
}
