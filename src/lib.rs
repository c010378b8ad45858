// AQI Dashboard - Core Library
// Exposes the classifier, recommendation lookup and impact estimator, plus
// the data, model and live-provider adapters used by the CLI, TUI and API server

pub mod category;
pub mod recommendations;
pub mod impact;
pub mod pollutants;
pub mod records;
pub mod model;
pub mod analytics;
pub mod config;
pub mod error;
pub mod logging;

#[cfg(feature = "live")]
pub mod live;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use category::{classify, AqiCategory, AqiValue};
pub use recommendations::{
    recommend, recommend_for_profiles, render_blocks,
    HealthProfile, RecommendationBlock, RecommendationEntry, RecommendationTable,
};
pub use impact::{
    estimate, estimate_car_removal_impact, estimate_tree_impact,
    ImpactResult, MitigationAction,
};
pub use pollutants::{Pollutant, PollutantReadings};
pub use records::{
    AirQualityRecord, CsvHistoricalSource, HistoricalDataPort, InMemoryHistoricalSource,
    export_csv, load_csv,
};
pub use model::{predict_with_category, LinearModel, ModelPort, Prediction};
pub use analytics::{
    AqiSummary, CityComparison, CityRanking, CityTrend, Heatmap, HeatmapRow,
    PollutantShare, TrendPoint,
};
pub use config::{Config, LiveConfig};
pub use error::{FetchError, ParseError};

#[cfg(feature = "live")]
pub use live::{
    LiveAqi, LiveAqiProvider, LiveStatus, OpenWeatherClient, WaqiClient,
    WeatherProvider, WeatherSnapshot,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
