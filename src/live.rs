// 📡 Live Providers - current AQI and weather over HTTP
//
// Both providers are plain timeout-bounded GETs with no retry. Callers that
// render dashboards go through `live_aqi_status` / `weather_status`, which
// turn any failure into `LiveStatus::Unavailable`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::category::{classify, AqiCategory, AqiValue};
use crate::config::LiveConfig;
use crate::error::FetchError;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveAqi {
    pub station: String,
    pub aqi: AqiValue,
    pub category: AqiCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant_pollutant: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub wind_speed_ms: f64,
    pub description: String,
}

/// What the dashboards see: data, or "unavailable" with no further detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum LiveStatus<T> {
    Available(T),
    Unavailable,
}

impl<T> LiveStatus<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, LiveStatus::Available(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            LiveStatus::Available(value) => Some(value),
            LiveStatus::Unavailable => None,
        }
    }
}

// ============================================================================
// PORTS
// ============================================================================

#[async_trait]
pub trait LiveAqiProvider: Send + Sync {
    async fn current_aqi(&self, city: &str) -> Result<LiveAqi, FetchError>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_weather(&self, city: &str) -> Result<WeatherSnapshot, FetchError>;
}

pub async fn live_aqi_status(provider: &dyn LiveAqiProvider, city: &str) -> LiveStatus<LiveAqi> {
    match provider.current_aqi(city).await {
        Ok(reading) => LiveStatus::Available(reading),
        Err(e) => {
            log::warn!("Live AQI unavailable for {}: {}", city, e);
            LiveStatus::Unavailable
        }
    }
}

pub async fn weather_status(
    provider: &dyn WeatherProvider,
    city: &str,
) -> LiveStatus<WeatherSnapshot> {
    match provider.current_weather(city).await {
        Ok(snapshot) => LiveStatus::Available(snapshot),
        Err(e) => {
            log::warn!("Weather unavailable for {}: {}", city, e);
            LiveStatus::Unavailable
        }
    }
}

// ============================================================================
// PAYLOAD PARSING
// ============================================================================

/// Parse a WAQI `/feed/<city>/` response.
pub fn parse_waqi_response(body: &str) -> Result<LiveAqi, FetchError> {
    let root: Value = serde_json::from_str(body)?;

    match root.get("status").and_then(Value::as_str) {
        Some("ok") => {}
        Some(_) => {
            let message = root
                .get("data")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(FetchError::Provider(message.to_string()));
        }
        None => return Err(FetchError::Payload("missing status field".to_string())),
    }

    let data = root
        .get("data")
        .ok_or_else(|| FetchError::Payload("missing data field".to_string()))?;

    // Stations without a current reading report "-".
    let aqi = match data.get("aqi") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| FetchError::Payload("no current AQI reading".to_string()))?;

    let station = data
        .pointer("/city/name")
        .and_then(Value::as_str)
        .unwrap_or("unknown station")
        .to_string();

    Ok(LiveAqi {
        station,
        aqi,
        category: classify(aqi),
        observed_at: data.pointer("/time/s").and_then(Value::as_str).map(str::to_string),
        dominant_pollutant: data.get("dominentpol").and_then(Value::as_str).map(str::to_string),
    })
}

#[derive(Debug, Deserialize)]
struct OpenWeatherResponse {
    name: String,
    main: OpenWeatherMain,
    #[serde(default)]
    wind: Option<OpenWeatherWind>,
    #[serde(default)]
    weather: Vec<OpenWeatherCondition>,
}

#[derive(Debug, Deserialize)]
struct OpenWeatherMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OpenWeatherWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OpenWeatherCondition {
    description: String,
}

/// Parse an OpenWeatherMap `/data/2.5/weather` response (metric units).
pub fn parse_openweather_response(body: &str) -> Result<WeatherSnapshot, FetchError> {
    let response: OpenWeatherResponse = serde_json::from_str(body)?;

    Ok(WeatherSnapshot {
        city: response.name,
        temperature_c: response.main.temp,
        humidity_percent: response.main.humidity,
        wind_speed_ms: response.wind.map(|w| w.speed).unwrap_or(0.0),
        description: response
            .weather
            .into_iter()
            .next()
            .map(|c| c.description)
            .unwrap_or_default(),
    })
}

// ============================================================================
// HTTP CLIENTS
// ============================================================================

fn http_client(config: &LiveConfig) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .timeout(config.timeout())
        .build()
        .map_err(|e| FetchError::Transport(e.to_string()))
}

async fn get_text(request: reqwest::RequestBuilder) -> Result<String, FetchError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    Ok(response.text().await?)
}

/// World Air Quality Index feed client.
pub struct WaqiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl WaqiClient {
    pub fn new(config: &LiveConfig) -> Result<Self, FetchError> {
        Ok(WaqiClient {
            http: http_client(config)?,
            base_url: config.waqi_base_url.trim_end_matches('/').to_string(),
            token: config.waqi_token.clone(),
        })
    }
}

#[async_trait]
impl LiveAqiProvider for WaqiClient {
    async fn current_aqi(&self, city: &str) -> Result<LiveAqi, FetchError> {
        let token = self
            .token
            .as_deref()
            .ok_or(FetchError::NotConfigured("WAQI token"))?;

        let url = format!("{}/feed/{}/", self.base_url, urlencoding::encode(city));
        log::debug!("GET {}", url);

        let body = get_text(self.http.get(&url).query(&[("token", token)])).await?;
        parse_waqi_response(&body)
    }
}

/// OpenWeatherMap current-weather client.
pub struct OpenWeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherClient {
    pub fn new(config: &LiveConfig) -> Result<Self, FetchError> {
        Ok(OpenWeatherClient {
            http: http_client(config)?,
            base_url: config.openweather_base_url.trim_end_matches('/').to_string(),
            api_key: config.openweather_api_key.clone(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current_weather(&self, city: &str) -> Result<WeatherSnapshot, FetchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(FetchError::NotConfigured("OpenWeatherMap API key"))?;

        let url = format!("{}/data/2.5/weather", self.base_url);
        log::debug!("GET {} q={}", url, city);

        let request = self
            .http
            .get(&url)
            .query(&[("q", city), ("appid", api_key), ("units", "metric")]);
        let body = get_text(request).await?;
        parse_openweather_response(&body)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticAqi(f64);

    #[async_trait]
    impl LiveAqiProvider for StaticAqi {
        async fn current_aqi(&self, city: &str) -> Result<LiveAqi, FetchError> {
            Ok(LiveAqi {
                station: city.to_string(),
                aqi: self.0,
                category: classify(self.0),
                observed_at: None,
                dominant_pollutant: None,
            })
        }
    }

    struct Down;

    #[async_trait]
    impl LiveAqiProvider for Down {
        async fn current_aqi(&self, _city: &str) -> Result<LiveAqi, FetchError> {
            Err(FetchError::Transport("connection refused".to_string()))
        }
    }

    #[async_trait]
    impl WeatherProvider for Down {
        async fn current_weather(&self, _city: &str) -> Result<WeatherSnapshot, FetchError> {
            Err(FetchError::Status(503))
        }
    }

    #[test]
    fn test_parse_waqi_ok() {
        let body = r#"{
            "status": "ok",
            "data": {
                "aqi": 162,
                "idx": 1451,
                "dominentpol": "pm25",
                "city": {"name": "Delhi US Embassy, India"},
                "time": {"s": "2024-11-05 14:00:00", "tz": "+05:30"}
            }
        }"#;
        let reading = parse_waqi_response(body).unwrap();

        assert_eq!(reading.station, "Delhi US Embassy, India");
        assert_eq!(reading.aqi, 162.0);
        assert_eq!(reading.category, AqiCategory::Moderate);
        assert_eq!(reading.observed_at.as_deref(), Some("2024-11-05 14:00:00"));
        assert_eq!(reading.dominant_pollutant.as_deref(), Some("pm25"));
    }

    #[test]
    fn test_parse_waqi_provider_error() {
        let err = parse_waqi_response(r#"{"status": "error", "data": "Unknown station"}"#).unwrap_err();
        assert!(matches!(err, FetchError::Provider(ref m) if m == "Unknown station"));
    }

    #[test]
    fn test_parse_waqi_without_reading() {
        let body = r#"{"status": "ok", "data": {"aqi": "-", "city": {"name": "Nowhere"}}}"#;
        assert!(matches!(parse_waqi_response(body), Err(FetchError::Payload(_))));
    }

    #[test]
    fn test_parse_waqi_garbage() {
        assert!(matches!(parse_waqi_response("<html>"), Err(FetchError::Payload(_))));
    }

    #[test]
    fn test_parse_openweather() {
        let body = r#"{
            "name": "Mumbai",
            "main": {"temp": 31.4, "humidity": 70, "pressure": 1008},
            "wind": {"speed": 4.1, "deg": 250},
            "weather": [{"id": 721, "main": "Haze", "description": "haze"}]
        }"#;
        let snapshot = parse_openweather_response(body).unwrap();

        assert_eq!(snapshot.city, "Mumbai");
        assert_eq!(snapshot.temperature_c, 31.4);
        assert_eq!(snapshot.humidity_percent, 70.0);
        assert_eq!(snapshot.wind_speed_ms, 4.1);
        assert_eq!(snapshot.description, "haze");
    }

    #[tokio::test]
    async fn test_failures_become_unavailable() {
        assert_eq!(live_aqi_status(&Down, "Delhi").await, LiveStatus::Unavailable);
        assert_eq!(weather_status(&Down, "Delhi").await, LiveStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_success_is_available() {
        let status = live_aqi_status(&StaticAqi(42.0), "Shillong").await;

        assert!(status.is_available());
        let reading = status.into_option().unwrap();
        assert_eq!(reading.station, "Shillong");
        assert_eq!(reading.category, AqiCategory::Good);
    }

    #[tokio::test]
    async fn test_missing_token_fails_without_network() {
        let client = WaqiClient::new(&LiveConfig::default()).unwrap();
        let err = client.current_aqi("Delhi").await.unwrap_err();
        assert!(matches!(err, FetchError::NotConfigured(_)));

        let weather = OpenWeatherClient::new(&LiveConfig::default()).unwrap();
        assert_eq!(weather_status(&weather, "Delhi").await, LiveStatus::Unavailable);
    }

    #[test]
    fn test_status_json_shape() {
        let unavailable: LiveStatus<LiveAqi> = LiveStatus::Unavailable;
        assert_eq!(
            serde_json::to_value(&unavailable).unwrap(),
            serde_json::json!({"status": "unavailable"})
        );
    }
}
