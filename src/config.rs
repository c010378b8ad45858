// ⚙️ Configuration - file defaults, environment overrides

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Historical dataset (city_day CSV layout).
    pub data_path: PathBuf,

    /// Linear model weights (JSON).
    pub model_path: PathBuf,

    /// Optional custom recommendation table; the builtin table is used when unset.
    pub recommendations_path: Option<PathBuf>,

    /// Address the API server binds to.
    pub server_addr: String,

    pub live: LiveConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    pub waqi_base_url: String,
    pub waqi_token: Option<String>,
    pub openweather_base_url: String,
    pub openweather_api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_path: PathBuf::from("city_day.csv"),
            model_path: PathBuf::from("aqi_model.json"),
            recommendations_path: None,
            server_addr: "0.0.0.0:3000".to_string(),
            live: LiveConfig::default(),
        }
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        LiveConfig {
            waqi_base_url: "https://api.waqi.info".to_string(),
            waqi_token: None,
            openweather_base_url: "https://api.openweathermap.org".to_string(),
            openweather_api_key: None,
            timeout_secs: 10,
        }
    }
}

impl LiveConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Defaults, then the JSON file if given, then environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    /// Apply overrides from a key lookup (the process environment in
    /// `load`). Unparseable numeric values are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("AQI_DATA_PATH") {
            self.data_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("AQI_MODEL_PATH") {
            self.model_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("AQI_RECOMMENDATIONS_PATH") {
            self.recommendations_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("AQI_SERVER_ADDR") {
            self.server_addr = v;
        }
        if let Some(v) = lookup("WAQI_TOKEN") {
            self.live.waqi_token = Some(v);
        }
        if let Some(v) = lookup("OPENWEATHER_API_KEY") {
            self.live.openweather_api_key = Some(v);
        }
        if let Some(v) = lookup("AQI_FETCH_TIMEOUT_SECS") {
            match v.parse() {
                Ok(secs) => self.live.timeout_secs = secs,
                Err(_) => log::warn!("Ignoring AQI_FETCH_TIMEOUT_SECS={:?}: not a number", v),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.data_path, PathBuf::from("city_day.csv"));
        assert_eq!(config.server_addr, "0.0.0.0:3000");
        assert_eq!(config.live.timeout(), Duration::from_secs(10));
        assert!(config.live.waqi_token.is_none());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"data_path": "/data/aqi.csv", "live": {"timeout_secs": 3}}"#,
        )
        .unwrap();

        assert_eq!(config.data_path, PathBuf::from("/data/aqi.csv"));
        assert_eq!(config.model_path, PathBuf::from("aqi_model.json"));
        assert_eq!(config.live.timeout_secs, 3);
        assert_eq!(config.live.waqi_base_url, "https://api.waqi.info");
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("AQI_MODEL_PATH", "/models/v2.json"),
            ("WAQI_TOKEN", "secret"),
            ("AQI_FETCH_TIMEOUT_SECS", "4"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.model_path, PathBuf::from("/models/v2.json"));
        assert_eq!(config.live.waqi_token.as_deref(), Some("secret"));
        assert_eq!(config.live.timeout_secs, 4);
        assert_eq!(config.data_path, PathBuf::from("city_day.csv"));
    }

    #[test]
    fn test_bad_timeout_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| {
            (key == "AQI_FETCH_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert_eq!(config.live.timeout_secs, 10);
    }
}
