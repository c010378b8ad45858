// AQI Dashboard - Web Server
// REST API with Axum over the historical dataset, model and live providers

use std::path::PathBuf;
use std::sync::Arc;

use aqi_dashboard::api::{self, AppState};
use aqi_dashboard::{
    logging, Config, CsvHistoricalSource, HistoricalDataPort, LinearModel, ModelPort,
    OpenWeatherClient, RecommendationTable, WaqiClient,
};

#[tokio::main]
async fn main() {
    logging::init(logging::default_level(false));

    println!("🌐 AQI Dashboard - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Optional config file as the only argument; env vars override it.
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match Config::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let data = match CsvHistoricalSource::open(&config.data_path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("❌ Dataset not loaded: {:#}", e);
            eprintln!("   Set AQI_DATA_PATH to a city_day CSV.");
            std::process::exit(1);
        }
    };
    println!("✓ Dataset loaded: {} records", data.records().len());

    let model: Option<Arc<dyn ModelPort>> = match LinearModel::from_file(&config.model_path) {
        Ok(model) => {
            println!("✓ Model loaded: {}", model.describe());
            Some(Arc::new(model))
        }
        Err(e) => {
            log::warn!("Prediction disabled: {:#}", e);
            None
        }
    };

    let recommendations = match &config.recommendations_path {
        Some(path) => RecommendationTable::from_file(path),
        None => Ok(RecommendationTable::builtin()),
    };
    let recommendations = match recommendations {
        Ok(table) => table,
        Err(e) => {
            eprintln!("❌ Recommendations not loaded: {:#}", e);
            std::process::exit(1);
        }
    };

    let clients = WaqiClient::new(&config.live)
        .and_then(|aqi| Ok((aqi, OpenWeatherClient::new(&config.live)?)));
    let (live_aqi, weather) = match clients {
        Ok(clients) => clients,
        Err(e) => {
            eprintln!("❌ HTTP client setup failed: {}", e);
            std::process::exit(1);
        }
    };
    if config.live.waqi_token.is_none() {
        log::warn!("WAQI_TOKEN not set; live AQI will report unavailable");
    }
    if config.live.openweather_api_key.is_none() {
        log::warn!("OPENWEATHER_API_KEY not set; weather will report unavailable");
    }

    let state = AppState {
        data: Arc::new(data),
        model,
        recommendations: Arc::new(recommendations),
        live_aqi: Arc::new(live_aqi),
        weather: Arc::new(weather),
    };

    let app = api::router(state);

    let addr = config.server_addr.as_str();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("❌ Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/cities", addr);
    println!("\n   Press Ctrl+C to stop\n");

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("❌ Server error: {}", e);
        std::process::exit(1);
    }
}
